use serde::Serialize;
use sqla::conf::DefaultDatabase;
use sqla::crud::{DatasourceStore, PgDb};
use sqla::error::Result;
use sqla::model::column::TableColumn;
use sqla::model::database::{Database, NewDatabase};
use sqla::model::metric::SqlMetric;
use sqla::model::table::SqlaTable;
use sqla::resolve::postgres::check_backend;
use uuid::Uuid;

/// A table together with the columns and metrics it owns, as shown by the show view
#[derive(Serialize, Debug)]
pub(crate) struct TableDetail {
    pub(crate) table: SqlaTable,
    pub(crate) full_name: String,
    pub(crate) columns: Vec<TableColumn>,
    pub(crate) metrics: Vec<SqlMetric>,
}

pub(crate) async fn load_table_detail(db: &mut PgDb<'_>, id: &Uuid) -> Result<TableDetail> {
    let table = db.get_table(id).await?;
    let database = db.get_database(&table.database_id).await?;
    Ok(TableDetail {
        full_name: table.full_name(&database),
        columns: db.get_columns(id).await?,
        metrics: db.get_metrics(id).await?,
        table,
    })
}

/// Registers the database connection configured through the environment, updating
/// its uri if a connection of the same name exists.
pub(crate) async fn register_default_database(
    db: &mut PgDb<'_>,
    default_database: &DefaultDatabase,
) -> Result<Database> {
    check_backend(&default_database.connection_uri)?;
    db.upsert_database(&NewDatabase {
        database_name: default_database.database_name.clone(),
        connection_uri: default_database.connection_uri.clone(),
    })
    .await
}
