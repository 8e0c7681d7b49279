pub mod postgres;
#[cfg(feature = "in-memory")]
pub mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::database::Database;

/// A column as declared in the physical database
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PhysicalColumn {
    pub name: String,
    /// Upper cased data type name as reported by the database, e.g. `CHARACTER VARYING`
    pub data_type: String,
}

/// Handle to a table or view which exists in a [Database]. Columns are in
/// declaration order.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PhysicalTable {
    pub schema: Option<String>,
    pub table_name: String,
    pub columns: Vec<PhysicalColumn>,
}

impl PhysicalTable {
    pub fn new(schema: Option<&str>, table_name: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            schema: schema.map(|s| s.to_string()),
            table_name: table_name.to_string(),
            columns: columns
                .iter()
                .map(|(name, data_type)| PhysicalColumn {
                    name: name.to_string(),
                    data_type: data_type.to_uppercase(),
                })
                .collect(),
        }
    }
}

#[async_trait]
pub trait TableResolver: Send + Sync {
    /// Looks up the physical table behind a datasource through the owning [Database]
    /// connection. Fails if the connection cannot be made or the table does not exist.
    async fn resolve(
        &self,
        database: &Database,
        schema: Option<&str>,
        table_name: &str,
    ) -> Result<PhysicalTable>;
}
