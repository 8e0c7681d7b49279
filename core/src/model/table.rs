use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConnectorError, Result};
use crate::model::database::Database;
use crate::schema::tables;

/// A queryable virtual table backed by a physical table or view in a [Database].
/// Identified by (database, schema, table_name). It owns its
/// [TableColumn][crate::model::column::TableColumn]s and
/// [SqlMetric][crate::model::metric::SqlMetric]s.
#[derive(
    Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Clone,
)]
#[diesel(belongs_to(Database))]
#[diesel(table_name = tables)]
pub struct SqlaTable {
    pub id: Uuid,
    pub table_name: String,
    pub database_id: Uuid,
    pub schema: Option<String>,
    /// Free-form SQL which is queried as a subquery in place of the physical table
    pub sql: Option<String>,
    pub description: Option<String>,
    /// Redirects to this endpoint when clicking on the table from the table list
    pub default_endpoint: Option<String>,
    pub cache_timeout: Option<i32>,
    /// Timezone offset in hours
    pub offset: i32,
    pub owner: Option<String>,
    pub main_dttm_col: Option<String>,
    pub fetch_values_predicate: Option<String>,
    pub filter_select_enabled: bool,
    pub perm: Option<String>,
    pub changed_on: NaiveDateTime,
}

impl SqlaTable {
    /// Name used in messages and as the prefix of metric permission strings,
    /// e.g. `[db1].[public].[sales]`.
    pub fn full_name(&self, database: &Database) -> String {
        full_name(&database.database_name, self.schema.as_deref(), &self.table_name)
    }

    /// Permission string of the `datasource_access` permission for this table.
    pub fn get_perm(&self, database: &Database) -> String {
        format!(
            "[{}].[{}](id:{})",
            database.database_name, self.table_name, self.id
        )
    }

    /// Permission string of the `schema_access` permission, only defined when a
    /// schema is set.
    pub fn schema_perm(&self, database: &Database) -> Option<String> {
        self.schema
            .as_ref()
            .map(|s| format!("[{}].[{}]", database.database_name, s))
    }

    /// Where operators land after saving an edited table
    pub fn explore_url(&self) -> String {
        format!("/explore/table/{}/", self.id)
    }
}

pub fn full_name(database_name: &str, schema: Option<&str>, table_name: &str) -> String {
    match schema {
        Some(s) => format!("[{}].[{}].[{}]", database_name, s, table_name),
        None => format!("[{}].[{}]", database_name, table_name),
    }
}

/// Used to create a new [SqlaTable] object in the database. This is the whole
/// add form, everything else is configured with a later edit.
#[derive(Serialize, Deserialize, Insertable, Debug, PartialEq, Clone)]
#[diesel(table_name = tables)]
pub struct NewSqlaTable {
    pub database_id: Uuid,
    pub schema: Option<String>,
    pub table_name: String,
}

impl NewSqlaTable {
    /// Trims the submitted values and treats an empty schema as no schema.
    pub fn normalized(self) -> Result<Self> {
        let table_name = self.table_name.trim().to_string();
        if table_name.is_empty() {
            return Err(ConnectorError::InvalidForm(
                "table_name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            database_id: self.database_id,
            schema: normalize_schema(self.schema),
            table_name,
        })
    }
}

/// The edit form of a [SqlaTable]. Forms are submitted whole, so a `None`
/// clears the stored value.
#[derive(Serialize, Deserialize, AsChangeset, Debug, PartialEq, Clone)]
#[diesel(table_name = tables)]
#[diesel(treat_none_as_null = true)]
pub struct TableEdit {
    pub table_name: String,
    pub sql: Option<String>,
    #[serde(default)]
    pub filter_select_enabled: bool,
    pub fetch_values_predicate: Option<String>,
    pub database_id: Uuid,
    pub schema: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub main_dttm_col: Option<String>,
    pub default_endpoint: Option<String>,
    #[serde(default)]
    pub offset: i32,
    pub cache_timeout: Option<i32>,
}

impl TableEdit {
    pub fn normalized(self) -> Result<Self> {
        let table_name = self.table_name.trim().to_string();
        if table_name.is_empty() {
            return Err(ConnectorError::InvalidForm(
                "table_name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            table_name,
            schema: normalize_schema(self.schema),
            ..self
        })
    }

    /// Form prefilled with the current state of a table
    pub fn from_table(table: &SqlaTable) -> Self {
        Self {
            table_name: table.table_name.clone(),
            sql: table.sql.clone(),
            filter_select_enabled: table.filter_select_enabled,
            fetch_values_predicate: table.fetch_values_predicate.clone(),
            database_id: table.database_id,
            schema: table.schema.clone(),
            description: table.description.clone(),
            owner: table.owner.clone(),
            main_dttm_col: table.main_dttm_col.clone(),
            default_endpoint: table.default_endpoint.clone(),
            offset: table.offset,
            cache_timeout: table.cache_timeout,
        }
    }
}

/// Search parameters of the table list view. Every set value must match.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
pub struct TableSearch {
    pub database_id: Option<Uuid>,
    pub schema: Option<String>,
    pub table_name: Option<String>,
}

fn normalize_schema(schema: Option<String>) -> Option<String> {
    schema
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
