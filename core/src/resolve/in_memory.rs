use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ConnectorError, Result};
use crate::model::database::Database;

use super::{PhysicalTable, TableResolver};

type TableKey = (Uuid, Option<String>, String);

/// [TableResolver] answering from a fixed set of tables
#[derive(Debug, Default, Clone)]
pub struct StaticTableResolver {
    tables: HashMap<TableKey, PhysicalTable>,
}

impl StaticTableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        mut self,
        database: &Database,
        schema: Option<&str>,
        table_name: &str,
        columns: &[(&str, &str)],
    ) -> Self {
        self.tables.insert(
            (
                database.id,
                schema.map(|s| s.to_string()),
                table_name.to_string(),
            ),
            PhysicalTable::new(schema, table_name, columns),
        );
        self
    }
}

#[async_trait]
impl TableResolver for StaticTableResolver {
    async fn resolve(
        &self,
        database: &Database,
        schema: Option<&str>,
        table_name: &str,
    ) -> Result<PhysicalTable> {
        let key = (
            database.id,
            schema.map(|s| s.to_string()),
            table_name.to_string(),
        );
        self.tables.get(&key).cloned().ok_or_else(|| {
            ConnectorError::NotFound(format!(
                "relation {} does not exist in {}",
                table_name, database.database_name
            ))
        })
    }
}
