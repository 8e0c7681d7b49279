use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::crud::{DatasourceStore, PermissionStore};
use crate::error::Result;
use crate::model::metric::{NewSqlMetric, SqlMetric};
use crate::model::permission::{PermissionKind, PermissionView};

/// Outcome of saving a metric through the metric view
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct MetricUpdate {
    pub metric: SqlMetric,
    /// The `metric_access` permission, only present for restricted metrics
    pub permission: Option<PermissionView>,
}

pub async fn create_metric<S>(store: &mut S, val: NewSqlMetric) -> Result<MetricUpdate>
where
    S: DatasourceStore + PermissionStore + ?Sized,
{
    val.validate()?;
    // the owning table must exist
    store.get_table(&val.table_id).await?;
    let metric = store.create_metric(&val).await?;
    let permission = sync_metric_permission(store, &metric).await?;
    Ok(MetricUpdate { metric, permission })
}

pub async fn update_metric<S>(store: &mut S, id: &Uuid, val: NewSqlMetric) -> Result<MetricUpdate>
where
    S: DatasourceStore + PermissionStore + ?Sized,
{
    val.validate()?;
    store.get_metric(id).await?;
    store.get_table(&val.table_id).await?;
    let metric = store.update_metric(id, &val).await?;
    let permission = sync_metric_permission(store, &metric).await?;
    Ok(MetricUpdate { metric, permission })
}

/// Deletes a metric and its `metric_access` permission, if it had one.
/// Returns the number of removed permissions.
pub async fn delete_metric<S>(store: &mut S, id: &Uuid) -> Result<usize>
where
    S: DatasourceStore + PermissionStore + ?Sized,
{
    let metric = store.get_metric(id).await?;
    let table = store.get_table(&metric.table_id).await?;
    let database = store.get_database(&table.database_id).await?;
    store.delete_metric(id).await?;
    let revoked = store
        .delete_perm(
            PermissionKind::MetricAccess,
            &metric.get_perm(&table.full_name(&database)),
        )
        .await?;
    info!("Deleted metric {}", metric.metric_name);
    Ok(revoked)
}

/// Makes sure a `metric_access` permission exists for a restricted metric.
///
/// Only adds permissions. Lifting the restriction of a metric leaves its
/// permission in place.
pub async fn sync_metric_permission<S>(
    store: &mut S,
    metric: &SqlMetric,
) -> Result<Option<PermissionView>>
where
    S: DatasourceStore + PermissionStore + ?Sized,
{
    if !metric.is_restricted {
        return Ok(None);
    }
    let table = store.get_table(&metric.table_id).await?;
    let database = store.get_database(&table.database_id).await?;
    let perm = metric.get_perm(&table.full_name(&database));
    let permission = store.merge_perm(PermissionKind::MetricAccess, &perm).await?;
    info!("Metric {} is restricted by {}", metric.metric_name, permission);
    Ok(Some(permission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::in_memory::InMemoryStore;
    use crate::error::ConnectorError;
    use crate::model::table::{NewSqlaTable, SqlaTable};

    async fn setup() -> Result<(InMemoryStore, SqlaTable)> {
        let mut store = InMemoryStore::new();
        let db = store.add_database("db1", "postgresql://localhost/db1");
        let table = store
            .create_table(&NewSqlaTable {
                database_id: db.id,
                schema: Some("public".to_string()),
                table_name: "sales".to_string(),
            })
            .await?;
        Ok((store, table))
    }

    fn revenue(table: &SqlaTable, is_restricted: bool) -> NewSqlMetric {
        NewSqlMetric {
            is_restricted,
            ..NewSqlMetric::aggregate(
                table.id,
                "sum",
                "revenue".to_string(),
                "SUM(amount)".to_string(),
            )
        }
    }

    #[tokio::test]
    async fn restricted_metric_gets_permission() -> Result<()> {
        let (mut store, table) = setup().await?;
        let saved = create_metric(&mut store, revenue(&table, true)).await?;
        let expected = format!(
            "[db1].[public].[sales].[revenue](id:{})",
            saved.metric.id
        );
        let permission = saved.permission.expect("restricted metric has a permission");
        assert_eq!(PermissionKind::MetricAccess, permission.permission_name);
        assert_eq!(expected, permission.view_menu_name);
        assert_eq!(1, store.permissions().perms().len());
        Ok(())
    }

    #[tokio::test]
    async fn unrestricted_metric_has_no_permission() -> Result<()> {
        let (mut store, table) = setup().await?;
        let saved = create_metric(&mut store, revenue(&table, false)).await?;
        assert_eq!(None, saved.permission);
        assert!(store.permissions().perms().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn lifting_restriction_keeps_permission() -> Result<()> {
        let (mut store, table) = setup().await?;
        let saved = create_metric(&mut store, revenue(&table, true)).await?;
        let id = saved.metric.id;

        let lifted = update_metric(&mut store, &id, revenue(&table, false)).await?;
        assert!(!lifted.metric.is_restricted);
        assert_eq!(None, lifted.permission);
        assert_eq!(1, store.permissions().count(PermissionKind::MetricAccess));

        let restored = update_metric(&mut store, &id, revenue(&table, true)).await?;
        assert_eq!(saved.permission, restored.permission);
        assert_eq!(1, store.permissions().count(PermissionKind::MetricAccess));
        Ok(())
    }

    #[tokio::test]
    async fn restricting_later_creates_permission() -> Result<()> {
        let (mut store, table) = setup().await?;
        let saved = create_metric(&mut store, revenue(&table, false)).await?;
        let updated = update_metric(&mut store, &saved.metric.id, revenue(&table, true)).await?;
        assert!(updated.permission.is_some());
        assert_eq!(1, store.permissions().count(PermissionKind::MetricAccess));
        Ok(())
    }

    #[tokio::test]
    async fn metric_needs_expression() -> Result<()> {
        let (mut store, table) = setup().await?;
        let err = create_metric(
            &mut store,
            NewSqlMetric {
                expression: " ".to_string(),
                ..revenue(&table, true)
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidForm(_)));
        assert!(store.metrics().is_empty());
        assert!(store.permissions().perms().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_metric_name_is_a_form_error() -> Result<()> {
        let (mut store, table) = setup().await?;
        create_metric(&mut store, revenue(&table, false)).await?;
        let err = create_metric(&mut store, revenue(&table, true))
            .await
            .unwrap_err();
        assert!(err.is_form_error());
        assert_eq!(1, store.metrics().len());
        assert!(store.permissions().perms().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn deleting_metric_revokes_its_permission() -> Result<()> {
        let (mut store, table) = setup().await?;
        let restricted = create_metric(&mut store, revenue(&table, true)).await?;
        let open = create_metric(
            &mut store,
            NewSqlMetric {
                metric_name: "orders".to_string(),
                ..revenue(&table, false)
            },
        )
        .await?;

        assert_eq!(0, delete_metric(&mut store, &open.metric.id).await?);
        assert_eq!(1, store.permissions().count(PermissionKind::MetricAccess));
        assert_eq!(1, delete_metric(&mut store, &restricted.metric.id).await?);
        assert!(store.permissions().perms().is_empty());
        assert!(store.metrics().is_empty());

        let err = delete_metric(&mut store, &restricted.metric.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::NotFound(_)));
        Ok(())
    }
}
