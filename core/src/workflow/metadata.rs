use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crud::DatasourceStore;
use crate::error::Result;
use crate::model::column::{NewTableColumn, TableColumn};
use crate::model::database::Database;
use crate::model::metric::NewSqlMetric;
use crate::model::table::SqlaTable;
use crate::resolve::TableResolver;

/// Identifiers matching this pattern are used bare in generated expressions
const BARE_IDENTIFIER: &str = r"^[a-z_][a-z0-9_]*$";

/// What a metadata refresh added to a table
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
pub struct MetadataRefresh {
    pub added_columns: Vec<String>,
    pub added_metrics: Vec<String>,
    /// Set when the refresh picked the main datetime column
    pub main_dttm_col: Option<String>,
}

/// Reconciles the columns and metrics of `table` with the physical table.
///
/// Columns already known keep every operator setting, only their type is
/// refreshed. Columns which disappeared from the physical table are kept. New
/// columns get flags defaulted from their type. Default aggregation metrics
/// are created for every enabled flag, plus a table wide `count`, unless a
/// metric of the same name exists.
pub async fn fetch_metadata<S, R>(
    store: &mut S,
    resolver: &R,
    table: &SqlaTable,
    database: &Database,
) -> Result<MetadataRefresh>
where
    S: DatasourceStore + ?Sized,
    R: TableResolver + ?Sized,
{
    let physical = resolver
        .resolve(database, table.schema.as_deref(), &table.table_name)
        .await?;
    let bare = Regex::new(BARE_IDENTIFIER)?;

    let mut known: HashMap<String, TableColumn> = store
        .get_columns(&table.id)
        .await?
        .into_iter()
        .map(|c| (c.column_name.clone(), c))
        .collect();

    let mut refresh = MetadataRefresh::default();
    let mut candidates = Vec::new();
    let mut any_date_col = None;

    for physical_column in &physical.columns {
        let column = match known.remove(&physical_column.name) {
            Some(mut column) => {
                if column.column_type.as_deref() != Some(physical_column.data_type.as_str()) {
                    debug!(
                        "Column {} of {} changed type to {}",
                        column.column_name, table.table_name, physical_column.data_type
                    );
                    store
                        .set_column_type(&column.id, &physical_column.data_type)
                        .await?;
                    column.column_type = Some(physical_column.data_type.clone());
                }
                column
            }
            None => {
                let column = store
                    .create_column(&NewTableColumn::discovered(
                        table.id,
                        &physical_column.name,
                        &physical_column.data_type,
                    ))
                    .await?;
                refresh.added_columns.push(column.column_name.clone());
                column
            }
        };
        if any_date_col.is_none() && column.is_dttm {
            any_date_col = Some(column.column_name.clone());
        }
        candidates.extend(default_metrics(&column, &bare));
    }
    candidates.push(NewSqlMetric {
        verbose_name: Some("COUNT(*)".to_string()),
        ..NewSqlMetric::aggregate(
            table.id,
            "count",
            "count".to_string(),
            "COUNT(*)".to_string(),
        )
    });

    let mut existing: HashSet<String> = store
        .get_metrics(&table.id)
        .await?
        .into_iter()
        .map(|m| m.metric_name)
        .collect();
    for candidate in candidates {
        if existing.insert(candidate.metric_name.clone()) {
            let metric = store.create_metric(&candidate).await?;
            refresh.added_metrics.push(metric.metric_name);
        }
    }

    if table.main_dttm_col.is_none() {
        if let Some(col) = any_date_col {
            store.set_main_dttm_col(&table.id, &col).await?;
            refresh.main_dttm_col = Some(col);
        }
    }

    info!(
        "Refreshed metadata of {}: {} new columns, {} new metrics",
        table.table_name,
        refresh.added_columns.len(),
        refresh.added_metrics.len()
    );
    Ok(refresh)
}

/// Quotes `name` for use in a SQL expression unless it is a plain lower case identifier
pub fn quote_identifier(name: &str, bare: &Regex) -> String {
    if bare.is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn default_metrics(column: &TableColumn, bare: &Regex) -> Vec<NewSqlMetric> {
    let name = &column.column_name;
    let quoted = quote_identifier(name, bare);
    let mut metrics = Vec::new();
    if column.sum {
        metrics.push(NewSqlMetric::aggregate(
            column.table_id,
            "sum",
            format!("sum__{name}"),
            format!("SUM({quoted})"),
        ));
    }
    if column.max {
        metrics.push(NewSqlMetric::aggregate(
            column.table_id,
            "max",
            format!("max__{name}"),
            format!("MAX({quoted})"),
        ));
    }
    if column.min {
        metrics.push(NewSqlMetric::aggregate(
            column.table_id,
            "min",
            format!("min__{name}"),
            format!("MIN({quoted})"),
        ));
    }
    if column.count_distinct {
        metrics.push(NewSqlMetric::aggregate(
            column.table_id,
            "count_distinct",
            format!("count_distinct__{name}"),
            format!("COUNT(DISTINCT {quoted})"),
        ));
    }
    metrics
}
