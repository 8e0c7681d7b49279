use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConnectorError, Result};
use crate::model::table::SqlaTable;
use crate::schema::sql_metrics;

/// A named SQL aggregation over a [SqlaTable]
#[derive(
    Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Clone,
)]
#[diesel(belongs_to(SqlaTable, foreign_key = table_id))]
#[diesel(table_name = sql_metrics)]
pub struct SqlMetric {
    pub id: Uuid,
    pub table_id: Uuid,
    pub metric_name: String,
    pub verbose_name: Option<String>,
    pub metric_type: Option<String>,
    /// e.g. `count(DISTINCT userid)`
    pub expression: String,
    pub description: Option<String>,
    /// d3-format string applied when the metric is displayed
    pub d3format: Option<String>,
    /// Access to a restricted metric requires the `metric_access` permission
    /// on its permission string.
    pub is_restricted: bool,
}

impl SqlMetric {
    /// Permission string of the `metric_access` permission for this metric.
    /// `table_full_name` is the [SqlaTable::full_name] of the owning table.
    pub fn get_perm(&self, table_full_name: &str) -> String {
        format!("{}.[{}](id:{})", table_full_name, self.metric_name, self.id)
    }
}

/// Used to create or edit a [SqlMetric]. Also the add and edit form of the metric view.
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Debug, PartialEq, Clone)]
#[diesel(table_name = sql_metrics)]
#[diesel(treat_none_as_null = true)]
pub struct NewSqlMetric {
    pub table_id: Uuid,
    pub metric_name: String,
    pub verbose_name: Option<String>,
    pub metric_type: Option<String>,
    pub expression: String,
    pub description: Option<String>,
    pub d3format: Option<String>,
    #[serde(default)]
    pub is_restricted: bool,
}

impl NewSqlMetric {
    pub fn validate(&self) -> Result<()> {
        if self.metric_name.trim().is_empty() {
            return Err(ConnectorError::InvalidForm(
                "metric_name must not be empty".to_string(),
            ));
        }
        if self.expression.trim().is_empty() {
            return Err(ConnectorError::InvalidForm(format!(
                "metric {} needs a SQL expression",
                self.metric_name
            )));
        }
        Ok(())
    }

    pub fn aggregate(table_id: Uuid, metric_type: &str, metric_name: String, expression: String) -> Self {
        Self {
            table_id,
            metric_name,
            verbose_name: None,
            metric_type: Some(metric_type.to_string()),
            expression,
            description: None,
            d3format: None,
            is_restricted: false,
        }
    }

    pub fn into_metric(self, id: Uuid) -> SqlMetric {
        SqlMetric {
            id,
            table_id: self.table_id,
            metric_name: self.metric_name,
            verbose_name: self.verbose_name,
            metric_type: self.metric_type,
            expression: self.expression,
            description: self.description,
            d3format: self.d3format,
            is_restricted: self.is_restricted,
        }
    }
}
