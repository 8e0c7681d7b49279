use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::crud::{DatasourceStore, PermissionStore};
use crate::error::{ConnectorError, Result};
use crate::model::database::Database;
use crate::model::permission::{PermissionKind, PermissionView};
use crate::model::table::{full_name, NewSqlaTable, SqlaTable, TableEdit};
use crate::resolve::TableResolver;

use super::form_database;
use super::metadata::{fetch_metadata, MetadataRefresh};

/// Shown to the operator after a table was registered
pub const TWO_PHASE_NOTICE: &str = "The table was created. As part of this two phase \
    configuration process, you should now click the edit button by the new table to configure it.";

/// Outcome of [register_datasource]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Registration {
    pub table: SqlaTable,
    pub notice: String,
    pub metadata: MetadataRefresh,
    pub permissions: Vec<PermissionView>,
}

/// Outcome of [update_datasource]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct TableUpdate {
    pub table: SqlaTable,
    /// Explore page of the table, where the operator is sent next
    pub redirect: String,
    pub metadata: MetadataRefresh,
    pub permissions: Vec<PermissionView>,
}

/// Registers a new datasource.
///
/// Every check runs before anything is written: a datasource with the same
/// (database, schema, table_name) must not exist and the physical table must
/// be reachable through the database connection. Afterwards the columns and
/// metrics are populated from the physical table and the access permissions of
/// the table, and of its schema when one is set, are merged.
pub async fn register_datasource<S, R>(
    store: &mut S,
    resolver: &R,
    candidate: NewSqlaTable,
) -> Result<Registration>
where
    S: DatasourceStore + PermissionStore + ?Sized,
    R: TableResolver + ?Sized,
{
    let candidate = candidate.normalized()?;
    let database = form_database(store, &candidate.database_id).await?;
    let name = full_name(
        &database.database_name,
        candidate.schema.as_deref(),
        &candidate.table_name,
    );

    let existing = store
        .count_tables(
            &candidate.table_name,
            candidate.schema.as_deref(),
            &candidate.database_id,
        )
        .await?;
    if existing > 0 {
        warn!("Refusing to register {name}, {existing} datasource(s) already use it");
        return Err(ConnectorError::DatasourceExists(name));
    }

    ensure_resolvable(
        resolver,
        &database,
        candidate.schema.as_deref(),
        &candidate.table_name,
    )
    .await?;

    let table = store.create_table(&candidate).await?;
    info!("Registered datasource {name} as {}", table.id);
    let (table, metadata, permissions) = sync_datasource(store, resolver, &table, &database).await?;
    Ok(Registration {
        table,
        notice: TWO_PHASE_NOTICE.to_string(),
        metadata,
        permissions,
    })
}

/// Applies an edit form to an existing datasource, then refreshes its metadata
/// and permissions the same way a registration does. The edited table must be
/// reachable, otherwise nothing is stored.
pub async fn update_datasource<S, R>(
    store: &mut S,
    resolver: &R,
    id: &Uuid,
    edit: TableEdit,
) -> Result<TableUpdate>
where
    S: DatasourceStore + PermissionStore + ?Sized,
    R: TableResolver + ?Sized,
{
    let edit = edit.normalized()?;
    let database = form_database(store, &edit.database_id).await?;
    store.get_table(id).await?;
    ensure_resolvable(resolver, &database, edit.schema.as_deref(), &edit.table_name).await?;

    let table = store.update_table(id, &edit).await?;
    info!("Updated datasource {}", table.full_name(&database));
    let (table, metadata, permissions) = sync_datasource(store, resolver, &table, &database).await?;
    Ok(TableUpdate {
        redirect: table.explore_url(),
        table,
        metadata,
        permissions,
    })
}

/// Deletes a datasource with its columns and metrics, and removes the
/// permissions scoped to the table and its metrics. The schema permission is
/// shared with other tables and stays. Returns the number of removed permissions.
pub async fn delete_datasource<S>(store: &mut S, id: &Uuid) -> Result<usize>
where
    S: DatasourceStore + PermissionStore + ?Sized,
{
    let table = store.get_table(id).await?;
    let database = store.get_database(&table.database_id).await?;
    let metrics = store.get_metrics(id).await?;
    store.delete_table(id).await?;

    let table_name = table.full_name(&database);
    let mut revoked = store
        .delete_perm(PermissionKind::DatasourceAccess, &table.get_perm(&database))
        .await?;
    for metric in &metrics {
        revoked += store
            .delete_perm(PermissionKind::MetricAccess, &metric.get_perm(&table_name))
            .await?;
    }
    info!("Deleted datasource {table_name} and {revoked} of its permissions");
    Ok(revoked)
}

/// Fails with [ConnectorError::TableNotFound] unless the physical table can be
/// resolved. The underlying cause is only logged.
async fn ensure_resolvable<R>(
    resolver: &R,
    database: &Database,
    schema: Option<&str>,
    table_name: &str,
) -> Result<()>
where
    R: TableResolver + ?Sized,
{
    if let Err(e) = resolver.resolve(database, schema, table_name).await {
        error!(
            "Could not resolve {}: {e}",
            full_name(&database.database_name, schema, table_name)
        );
        return Err(ConnectorError::TableNotFound(table_name.to_string()));
    }
    Ok(())
}

/// Post-save step shared by add and edit
async fn sync_datasource<S, R>(
    store: &mut S,
    resolver: &R,
    table: &SqlaTable,
    database: &Database,
) -> Result<(SqlaTable, MetadataRefresh, Vec<PermissionView>)>
where
    S: DatasourceStore + PermissionStore + ?Sized,
    R: TableResolver + ?Sized,
{
    let metadata = fetch_metadata(store, resolver, table, database).await?;

    let perm = table.get_perm(database);
    store.set_table_perm(&table.id, &perm).await?;
    let mut permissions = vec![store.merge_perm(PermissionKind::DatasourceAccess, &perm).await?];
    if let Some(schema_perm) = table.schema_perm(database) {
        permissions.push(
            store
                .merge_perm(PermissionKind::SchemaAccess, &schema_perm)
                .await?,
        );
    }

    Ok((store.get_table(&table.id).await?, metadata, permissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::in_memory::InMemoryStore;
    use crate::model::metric::NewSqlMetric;
    use crate::resolve::in_memory::StaticTableResolver;
    use crate::workflow::metric::create_metric;

    const SALES_COLUMNS: [(&str, &str); 3] = [
        ("region", "character varying"),
        ("amount", "numeric"),
        ("sold_at", "timestamp without time zone"),
    ];

    struct Fixture {
        store: InMemoryStore,
        resolver: StaticTableResolver,
        db: Database,
    }

    fn fixture() -> Fixture {
        let mut store = InMemoryStore::new();
        let db = store.add_database("db1", "postgresql://localhost/db1");
        let resolver = StaticTableResolver::new()
            .with_table(&db, Some("public"), "sales", &SALES_COLUMNS)
            .with_table(&db, Some("archive"), "sales", &SALES_COLUMNS)
            .with_table(&db, None, "events", &[("id", "bigint")]);
        Fixture {
            store,
            resolver,
            db,
        }
    }

    fn candidate(db: &Database, schema: Option<&str>, table_name: &str) -> NewSqlaTable {
        NewSqlaTable {
            database_id: db.id,
            schema: schema.map(|s| s.to_string()),
            table_name: table_name.to_string(),
        }
    }

    #[tokio::test]
    async fn registers_table_with_permissions() -> Result<()> {
        let mut f = fixture();
        let registration = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?;

        let table = &registration.table;
        assert_eq!(TWO_PHASE_NOTICE, registration.notice);
        let perm = format!("[db1].[sales](id:{})", table.id);
        assert_eq!(Some(perm.clone()), table.perm);
        assert_eq!(Some("sold_at".to_string()), table.main_dttm_col);
        assert_eq!(3, f.store.columns().len());
        assert_eq!(4, f.store.metrics().len());

        assert_eq!(2, f.store.permissions().perms().len());
        assert!(f
            .store
            .find_perm(PermissionKind::DatasourceAccess, &perm)
            .await?
            .is_some());
        assert!(f
            .store
            .find_perm(PermissionKind::SchemaAccess, "[db1].[public]")
            .await?
            .is_some());
        assert_eq!(
            f.store.permissions().perms(),
            registration.permissions.as_slice()
        );
        Ok(())
    }

    #[tokio::test]
    async fn rejects_duplicate_without_writing() -> Result<()> {
        let mut f = fixture();
        register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?;

        let err = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), " sales "),
        )
        .await
        .unwrap_err();
        assert_eq!(
            "Datasource [db1].[public].[sales] already exists",
            err.to_string()
        );
        assert_eq!(1, f.store.tables().len());
        assert_eq!(3, f.store.columns().len());
        assert_eq!(2, f.store.permissions().perms().len());
        Ok(())
    }

    #[tokio::test]
    async fn same_name_in_other_schema_is_distinct() -> Result<()> {
        let mut f = fixture();
        register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?;
        register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("archive"), "sales"),
        )
        .await?;
        assert_eq!(2, f.store.tables().len());
        assert_eq!(
            2,
            f.store.permissions().count(PermissionKind::SchemaAccess)
        );
        Ok(())
    }

    #[tokio::test]
    async fn unresolvable_table_is_not_registered() {
        let mut f = fixture();
        let err = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "ghost_table"),
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, ConnectorError::TableNotFound(name) if name == "ghost_table"));
        assert!(err.is_form_error());
        assert!(f.store.tables().is_empty());
        assert!(f.store.permissions().perms().is_empty());
    }

    #[tokio::test]
    async fn unknown_database_is_a_form_error() {
        let mut f = fixture();
        let err = register_datasource(
            &mut f.store,
            &f.resolver,
            NewSqlaTable {
                database_id: Uuid::new_v4(),
                schema: None,
                table_name: "sales".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidForm(_)));
        assert!(f.store.tables().is_empty());
    }

    #[tokio::test]
    async fn no_schema_access_without_schema() -> Result<()> {
        let mut f = fixture();
        let registration =
            register_datasource(&mut f.store, &f.resolver, candidate(&f.db, Some(""), "events"))
                .await?;
        assert_eq!(None, registration.table.schema);
        assert_eq!(1, f.store.permissions().perms().len());
        assert_eq!(
            0,
            f.store.permissions().count(PermissionKind::SchemaAccess)
        );
        Ok(())
    }

    #[tokio::test]
    async fn edit_redirects_and_keeps_permissions_unique() -> Result<()> {
        let mut f = fixture();
        let registration = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?;
        let id = registration.table.id;

        let edit = TableEdit {
            description: Some("Daily sales".to_string()),
            cache_timeout: Some(600),
            ..TableEdit::from_table(&registration.table)
        };
        let updated = update_datasource(&mut f.store, &f.resolver, &id, edit).await?;
        assert_eq!(format!("/explore/table/{}/", id), updated.redirect);
        assert_eq!(Some("Daily sales".to_string()), updated.table.description);
        assert_eq!(Some(600), updated.table.cache_timeout);
        assert_eq!(MetadataRefresh::default(), updated.metadata);

        let again = TableEdit::from_table(&updated.table);
        update_datasource(&mut f.store, &f.resolver, &id, again).await?;
        let permissions = f.store.permissions();
        assert_eq!(1, permissions.count(PermissionKind::DatasourceAccess));
        assert_eq!(1, permissions.count(PermissionKind::SchemaAccess));
        assert_eq!(3, f.store.columns().len());
        assert_eq!(4, f.store.metrics().len());
        Ok(())
    }

    #[tokio::test]
    async fn edit_to_unknown_table_is_rejected_before_saving() -> Result<()> {
        let mut f = fixture();
        let registration = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?;
        let id = registration.table.id;

        let edit = TableEdit {
            table_name: "salez".to_string(),
            ..TableEdit::from_table(&registration.table)
        };
        let err = update_datasource(&mut f.store, &f.resolver, &id, edit)
            .await
            .unwrap_err();
        assert!(matches!(&err, ConnectorError::TableNotFound(name) if name == "salez"));
        assert!(err.is_form_error());
        assert_eq!("sales", f.store.get_table(&id).await?.table_name);
        assert_eq!(2, f.store.permissions().perms().len());
        Ok(())
    }

    #[tokio::test]
    async fn edit_of_missing_table_is_not_found() {
        let mut f = fixture();
        let edit = TableEdit::from_table(&SqlaTable {
            id: Uuid::new_v4(),
            table_name: "sales".to_string(),
            database_id: f.db.id,
            schema: Some("public".to_string()),
            sql: None,
            description: None,
            default_endpoint: None,
            cache_timeout: None,
            offset: 0,
            owner: None,
            main_dttm_col: None,
            fetch_values_predicate: None,
            filter_select_enabled: false,
            perm: None,
            changed_on: chrono::Utc::now().naive_utc(),
        });
        let err = update_datasource(&mut f.store, &f.resolver, &Uuid::new_v4(), edit)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_revokes_table_scoped_permissions() -> Result<()> {
        let mut f = fixture();
        let sales = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("public"), "sales"),
        )
        .await?
        .table;
        let archive = register_datasource(
            &mut f.store,
            &f.resolver,
            candidate(&f.db, Some("archive"), "sales"),
        )
        .await?
        .table;
        create_metric(
            &mut f.store,
            NewSqlMetric {
                is_restricted: true,
                ..NewSqlMetric::aggregate(
                    sales.id,
                    "sum",
                    "revenue".to_string(),
                    "SUM(amount)".to_string(),
                )
            },
        )
        .await?;
        assert_eq!(5, f.store.permissions().perms().len());

        // datasource_access and the revenue metric_access
        assert_eq!(2, delete_datasource(&mut f.store, &sales.id).await?);

        let permissions = f.store.permissions();
        assert_eq!(0, permissions.count(PermissionKind::MetricAccess));
        assert_eq!(1, permissions.count(PermissionKind::DatasourceAccess));
        assert_eq!(2, permissions.count(PermissionKind::SchemaAccess));
        assert_eq!(vec![archive.clone()], f.store.tables().to_vec());
        assert!(f.store.metrics().iter().all(|m| m.table_id == archive.id));

        let err = delete_datasource(&mut f.store, &sales.id).await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotFound(_)));
        Ok(())
    }
}
