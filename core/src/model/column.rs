use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConnectorError, Result};
use crate::model::table::SqlaTable;
use crate::schema::table_columns;

const STRING_TYPE_MARKERS: [&str; 3] = ["CHAR", "STRING", "TEXT"];
const NUM_TYPE_TOKENS: [&str; 17] = [
    "INT", "INTEGER", "SMALLINT", "BIGINT", "TINYINT", "INT2", "INT4", "INT8", "LONG", "DOUBLE",
    "FLOAT", "FLOAT4", "FLOAT8", "REAL", "NUMERIC", "DECIMAL", "NUMBER",
];
const TIME_TYPE_TOKENS: [&str; 6] = [
    "DATE",
    "TIME",
    "TIMESTAMP",
    "DATETIME",
    "TIMESTAMPTZ",
    "TIMETZ",
];

/// A column of a [SqlaTable], either discovered from the physical table or
/// defined by an operator through an expression.
#[derive(
    Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Clone,
)]
#[diesel(belongs_to(SqlaTable, foreign_key = table_id))]
#[diesel(table_name = table_columns)]
pub struct TableColumn {
    pub id: Uuid,
    pub table_id: Uuid,
    pub column_name: String,
    pub verbose_name: Option<String>,
    pub description: Option<String>,
    /// Data type as inferred from the database, or as set by an operator
    pub column_type: Option<String>,
    pub groupby: bool,
    pub filterable: bool,
    pub count_distinct: bool,
    pub sum: bool,
    pub min: bool,
    pub max: bool,
    /// SQL used in place of the column name, e.g. `substr(name, 1, 1)`
    pub expression: Option<String>,
    pub is_dttm: bool,
    /// strftime pattern, or `epoch_s` / `epoch_ms`
    pub python_date_format: Option<String>,
    /// Template used to cast a datetime constant to the database type,
    /// e.g. `TO_DATE('{}', 'YYYY-MM-DD HH24:MI:SS')`
    pub database_expression: Option<String>,
}

/// Used to create or edit a [TableColumn]. Also the add and edit form of the column view.
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Debug, PartialEq, Clone)]
#[diesel(table_name = table_columns)]
#[diesel(treat_none_as_null = true)]
pub struct NewTableColumn {
    pub table_id: Uuid,
    pub column_name: String,
    pub verbose_name: Option<String>,
    pub description: Option<String>,
    pub column_type: Option<String>,
    #[serde(default)]
    pub groupby: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub count_distinct: bool,
    #[serde(default)]
    pub sum: bool,
    #[serde(default)]
    pub min: bool,
    #[serde(default)]
    pub max: bool,
    pub expression: Option<String>,
    #[serde(default)]
    pub is_dttm: bool,
    pub python_date_format: Option<String>,
    pub database_expression: Option<String>,
}

impl NewTableColumn {
    pub fn validate(&self) -> Result<()> {
        if self.column_name.trim().is_empty() {
            return Err(ConnectorError::InvalidForm(
                "column_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// A column freshly discovered in the physical table, with flags defaulted
    /// from its data type.
    pub fn discovered(table_id: Uuid, column_name: &str, column_type: &str) -> Self {
        let class = TypeClass::of(column_type);
        Self {
            table_id,
            column_name: column_name.to_string(),
            verbose_name: None,
            description: None,
            column_type: Some(column_type.to_string()),
            groupby: class.is_string,
            filterable: class.is_string,
            count_distinct: false,
            sum: class.is_num,
            min: class.is_num,
            max: class.is_num,
            expression: None,
            is_dttm: class.is_time,
            python_date_format: None,
            database_expression: None,
        }
    }

    pub fn into_column(self, id: Uuid) -> TableColumn {
        TableColumn {
            id,
            table_id: self.table_id,
            column_name: self.column_name,
            verbose_name: self.verbose_name,
            description: self.description,
            column_type: self.column_type,
            groupby: self.groupby,
            filterable: self.filterable,
            count_distinct: self.count_distinct,
            sum: self.sum,
            min: self.min,
            max: self.max,
            expression: self.expression,
            is_dttm: self.is_dttm,
            python_date_format: self.python_date_format,
            database_expression: self.database_expression,
        }
    }
}

/// Coarse classification of a database data type name
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TypeClass {
    pub is_string: bool,
    pub is_num: bool,
    pub is_time: bool,
}

impl TypeClass {
    pub fn of(data_type: &str) -> Self {
        let upper = data_type.to_uppercase();
        let tokens: Vec<&str> = upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            is_string: STRING_TYPE_MARKERS.iter().any(|m| upper.contains(m)),
            is_num: tokens.iter().any(|t| NUM_TYPE_TOKENS.contains(t)),
            is_time: tokens.iter().any(|t| TIME_TYPE_TOKENS.contains(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_postgres_types() {
        assert!(TypeClass::of("CHARACTER VARYING").is_string);
        assert!(TypeClass::of("text").is_string);
        assert!(TypeClass::of("INTEGER").is_num);
        assert!(TypeClass::of("DOUBLE PRECISION").is_num);
        assert!(TypeClass::of("NUMERIC(10, 2)").is_num);
        assert!(TypeClass::of("TIMESTAMP WITHOUT TIME ZONE").is_time);
        assert!(TypeClass::of("DATE").is_time);
        assert_eq!(TypeClass::default(), TypeClass::of("INTERVAL"));
        assert_eq!(TypeClass::default(), TypeClass::of("BOOLEAN"));
    }

    #[test]
    fn discovered_column_flags_follow_type() {
        let table_id = Uuid::new_v4();
        let region = NewTableColumn::discovered(table_id, "region", "CHARACTER VARYING");
        assert!(region.groupby && region.filterable);
        assert!(!region.sum && !region.is_dttm);

        let amount = NewTableColumn::discovered(table_id, "amount", "NUMERIC");
        assert!(amount.sum && amount.min && amount.max);
        assert!(!amount.groupby);

        let sold_at = NewTableColumn::discovered(table_id, "sold_at", "TIMESTAMP");
        assert!(sold_at.is_dttm);
        assert!(!sold_at.sum);
    }
}
