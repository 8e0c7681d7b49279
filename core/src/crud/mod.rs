use std::time::Duration;

use crate::error::ConnectorError;
use crate::error::Result;
use crate::model::column::{NewTableColumn, TableColumn};
use crate::model::database::Database;
use crate::model::metric::{NewSqlMetric, SqlMetric};
use crate::model::permission::{PermissionKind, PermissionView};
use crate::model::table::{NewSqlaTable, SqlaTable, TableEdit};

use async_trait::async_trait;
use diesel::Connection;
use diesel::PgConnection;
use diesel_async::{
    pooled_connection::bb8::{Pool, PooledConnection},
    AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::error;
use uuid::Uuid;

mod column;
mod database;
#[cfg(feature = "in-memory")]
pub mod in_memory;
mod permission;
mod table;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Bootstraps database with diesel migrations uses embedded code. Continues to retry on error, logging
/// the error cause, and sleeping for a time. Intermittent connectivity errors on startup are expected while
/// Postgres is initializing. Panics if the migrations fail for any reason other inability to connect.
pub fn run_migrations(db_url: &str) {
    let mut con;
    loop {
        let maybe_connected = PgConnection::establish(db_url);
        match maybe_connected {
            Ok(c) => {
                con = c;
                break;
            }
            Err(e) => {
                error!("Failed connecting to postgres with error: {e}... retrying migrations in 5 seconds");
                std::thread::sleep(Duration::from_secs(5))
            }
        }
    }

    con.run_pending_migrations(MIGRATIONS)
        .unwrap_or_else(|e| panic!("Error running migrations for {} with error {e}", db_url));
}

/// Storage of datasources and the columns and metrics they own, as needed by the
/// registration and metadata workflows.
#[async_trait]
pub trait DatasourceStore: Send {
    async fn get_database(&mut self, id: &Uuid) -> Result<Database>;

    /// Number of stored tables registered under the same (table_name, schema, database).
    /// A `None` schema only matches tables without a schema.
    async fn count_tables(
        &mut self,
        table_name: &str,
        schema: Option<&str>,
        database_id: &Uuid,
    ) -> Result<i64>;

    async fn create_table(&mut self, val: &NewSqlaTable) -> Result<SqlaTable>;

    async fn get_table(&mut self, id: &Uuid) -> Result<SqlaTable>;

    async fn update_table(&mut self, id: &Uuid, val: &TableEdit) -> Result<SqlaTable>;

    /// Deletes a table together with its columns and metrics. Returns the number
    /// of deleted tables.
    async fn delete_table(&mut self, id: &Uuid) -> Result<usize>;

    async fn set_table_perm(&mut self, id: &Uuid, perm: &str) -> Result<()>;

    async fn set_main_dttm_col(&mut self, id: &Uuid, column_name: &str) -> Result<()>;

    async fn get_columns(&mut self, table_id: &Uuid) -> Result<Vec<TableColumn>>;

    async fn create_column(&mut self, val: &NewTableColumn) -> Result<TableColumn>;

    async fn set_column_type(&mut self, id: &Uuid, column_type: &str) -> Result<()>;

    async fn get_metrics(&mut self, table_id: &Uuid) -> Result<Vec<SqlMetric>>;

    async fn get_metric(&mut self, id: &Uuid) -> Result<SqlMetric>;

    async fn create_metric(&mut self, val: &NewSqlMetric) -> Result<SqlMetric>;

    async fn update_metric(&mut self, id: &Uuid, val: &NewSqlMetric) -> Result<SqlMetric>;

    async fn delete_metric(&mut self, id: &Uuid) -> Result<usize>;
}

/// Storage of [PermissionView]s
#[async_trait]
pub trait PermissionStore: Send {
    /// Returns the permission for (kind, view_menu_name), creating it first if it
    /// does not exist yet. Never creates duplicates.
    async fn merge_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<PermissionView>;

    async fn find_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<Option<PermissionView>>;

    /// Removes the permission if it exists. Returns the number of removed permissions.
    async fn delete_perm(&mut self, kind: PermissionKind, view_menu_name: &str) -> Result<usize>;
}

/// Holds a [AsyncPgConnection] borrowed from a [Pool] and implements CRUD operations
pub struct PgDb<'a> {
    con: PooledConnection<'a, AsyncPgConnection>,
}

// See sub modules for additional method impls
impl<'a> PgDb<'a> {
    pub async fn try_from_pool(pool: &'a Pool<AsyncPgConnection>) -> Result<PgDb<'a>> {
        let con = pool.get().await.map_err(|_| {
            ConnectorError::DbError("Error connecting to the database connection pool!".into())
        })?;
        Ok(Self { con })
    }
}
