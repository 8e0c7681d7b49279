//! Multi step operations performed when operators save datasources, columns and
//! metrics. Every workflow is generic over the stores and the resolver, so the
//! same code runs against postgres and against the in-memory implementations.

pub mod datasource;
pub mod metadata;
pub mod metric;

pub use datasource::{
    delete_datasource, register_datasource, update_datasource, Registration, TableUpdate,
};
pub use metadata::{fetch_metadata, MetadataRefresh};
pub use metric::{
    create_metric, delete_metric, sync_metric_permission, update_metric, MetricUpdate,
};

use crate::crud::DatasourceStore;
use crate::error::{ConnectorError, Result};
use crate::model::database::Database;
use uuid::Uuid;

/// Loads the database referenced by a submitted form. A dangling reference is a
/// problem with the form, not a missing resource.
pub(crate) async fn form_database<S>(store: &mut S, database_id: &Uuid) -> Result<Database>
where
    S: DatasourceStore + ?Sized,
{
    match store.get_database(database_id).await {
        Ok(database) => Ok(database),
        Err(ConnectorError::NotFound(_)) => Err(ConnectorError::InvalidForm(format!(
            "database {} does not exist",
            database_id
        ))),
        Err(e) => Err(e),
    }
}
