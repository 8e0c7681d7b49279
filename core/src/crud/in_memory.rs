use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ConnectorError, Result};
use crate::model::column::{NewTableColumn, TableColumn};
use crate::model::database::Database;
use crate::model::metric::{NewSqlMetric, SqlMetric};
use crate::model::permission::{PermissionKind, PermissionView};
use crate::model::table::{NewSqlaTable, SqlaTable, TableEdit};

use super::{DatasourceStore, PermissionStore};

/// [DatasourceStore] and [PermissionStore] held in process memory. Applies the
/// same uniqueness and cascade rules as the postgres schema.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    databases: HashMap<Uuid, Database>,
    tables: Vec<SqlaTable>,
    columns: Vec<TableColumn>,
    metrics: Vec<SqlMetric>,
    permissions: InMemoryPermissions,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_database(&mut self, database_name: &str, connection_uri: &str) -> Database {
        let database = Database {
            id: Uuid::new_v4(),
            database_name: database_name.to_string(),
            connection_uri: connection_uri.to_string(),
        };
        self.databases.insert(database.id, database.clone());
        database
    }

    pub fn tables(&self) -> &[SqlaTable] {
        &self.tables
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn metrics(&self) -> &[SqlMetric] {
        &self.metrics
    }

    pub fn permissions(&self) -> &InMemoryPermissions {
        &self.permissions
    }

    fn table_mut(&mut self, id: &Uuid) -> Result<&mut SqlaTable> {
        self.tables
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| ConnectorError::NotFound(format!("table {id}")))
    }
}

#[async_trait]
impl DatasourceStore for InMemoryStore {
    async fn get_database(&mut self, id: &Uuid) -> Result<Database> {
        self.databases
            .get(id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("database {id}")))
    }

    async fn count_tables(
        &mut self,
        table_name: &str,
        schema: Option<&str>,
        database_id: &Uuid,
    ) -> Result<i64> {
        Ok(self
            .tables
            .iter()
            .filter(|t| {
                t.table_name == table_name
                    && t.schema.as_deref() == schema
                    && &t.database_id == database_id
            })
            .count() as i64)
    }

    async fn create_table(&mut self, val: &NewSqlaTable) -> Result<SqlaTable> {
        if !self.databases.contains_key(&val.database_id) {
            return Err(ConnectorError::DbError(format!(
                "database {} does not exist",
                val.database_id
            )));
        }
        let table = SqlaTable {
            id: Uuid::new_v4(),
            table_name: val.table_name.clone(),
            database_id: val.database_id,
            schema: val.schema.clone(),
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
            changed_on: Utc::now().naive_utc(),
        };
        self.tables.push(table.clone());
        Ok(table)
    }

    async fn get_table(&mut self, id: &Uuid) -> Result<SqlaTable> {
        Ok(self.table_mut(id)?.clone())
    }

    async fn update_table(&mut self, id: &Uuid, val: &TableEdit) -> Result<SqlaTable> {
        let table = self.table_mut(id)?;
        table.table_name = val.table_name.clone();
        table.sql = val.sql.clone();
        table.filter_select_enabled = val.filter_select_enabled;
        table.fetch_values_predicate = val.fetch_values_predicate.clone();
        table.database_id = val.database_id;
        table.schema = val.schema.clone();
        table.description = val.description.clone();
        table.owner = val.owner.clone();
        table.main_dttm_col = val.main_dttm_col.clone();
        table.default_endpoint = val.default_endpoint.clone();
        table.offset = val.offset;
        table.cache_timeout = val.cache_timeout;
        table.changed_on = Utc::now().naive_utc();
        Ok(table.clone())
    }

    async fn delete_table(&mut self, id: &Uuid) -> Result<usize> {
        let before = self.tables.len();
        self.tables.retain(|t| &t.id != id);
        let removed = before - self.tables.len();
        if removed > 0 {
            self.columns.retain(|c| &c.table_id != id);
            self.metrics.retain(|m| &m.table_id != id);
        }
        Ok(removed)
    }

    async fn set_table_perm(&mut self, id: &Uuid, perm: &str) -> Result<()> {
        self.table_mut(id)?.perm = Some(perm.to_string());
        Ok(())
    }

    async fn set_main_dttm_col(&mut self, id: &Uuid, column_name: &str) -> Result<()> {
        self.table_mut(id)?.main_dttm_col = Some(column_name.to_string());
        Ok(())
    }

    async fn get_columns(&mut self, table_id: &Uuid) -> Result<Vec<TableColumn>> {
        let mut columns: Vec<TableColumn> = self
            .columns
            .iter()
            .filter(|c| &c.table_id == table_id)
            .cloned()
            .collect();
        columns.sort_by(|a, b| a.column_name.cmp(&b.column_name));
        Ok(columns)
    }

    async fn create_column(&mut self, val: &NewTableColumn) -> Result<TableColumn> {
        if self
            .columns
            .iter()
            .any(|c| c.table_id == val.table_id && c.column_name == val.column_name)
        {
            return Err(ConnectorError::InvalidForm(format!(
                "duplicate column {} for table {}",
                val.column_name, val.table_id
            )));
        }
        let column = val.clone().into_column(Uuid::new_v4());
        self.columns.push(column.clone());
        Ok(column)
    }

    async fn set_column_type(&mut self, id: &Uuid, column_type: &str) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ConnectorError::NotFound(format!("column {id}")))?;
        column.column_type = Some(column_type.to_string());
        Ok(())
    }

    async fn get_metrics(&mut self, table_id: &Uuid) -> Result<Vec<SqlMetric>> {
        let mut metrics: Vec<SqlMetric> = self
            .metrics
            .iter()
            .filter(|m| &m.table_id == table_id)
            .cloned()
            .collect();
        metrics.sort_by(|a, b| a.metric_name.cmp(&b.metric_name));
        Ok(metrics)
    }

    async fn get_metric(&mut self, id: &Uuid) -> Result<SqlMetric> {
        self.metrics
            .iter()
            .find(|m| &m.id == id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("metric {id}")))
    }

    async fn create_metric(&mut self, val: &NewSqlMetric) -> Result<SqlMetric> {
        if self
            .metrics
            .iter()
            .any(|m| m.table_id == val.table_id && m.metric_name == val.metric_name)
        {
            return Err(ConnectorError::InvalidForm(format!(
                "duplicate metric {} for table {}",
                val.metric_name, val.table_id
            )));
        }
        let metric = val.clone().into_metric(Uuid::new_v4());
        self.metrics.push(metric.clone());
        Ok(metric)
    }

    async fn update_metric(&mut self, id: &Uuid, val: &NewSqlMetric) -> Result<SqlMetric> {
        let metric = self
            .metrics
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| ConnectorError::NotFound(format!("metric {id}")))?;
        *metric = val.clone().into_metric(*id);
        Ok(metric.clone())
    }

    async fn delete_metric(&mut self, id: &Uuid) -> Result<usize> {
        let before = self.metrics.len();
        self.metrics.retain(|m| &m.id != id);
        Ok(before - self.metrics.len())
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn merge_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<PermissionView> {
        self.permissions.merge_perm(kind, view_menu_name).await
    }

    async fn find_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<Option<PermissionView>> {
        self.permissions.find_perm(kind, view_menu_name).await
    }

    async fn delete_perm(&mut self, kind: PermissionKind, view_menu_name: &str) -> Result<usize> {
        self.permissions.delete_perm(kind, view_menu_name).await
    }
}

/// [PermissionStore] held in process memory
#[derive(Debug, Default)]
pub struct InMemoryPermissions {
    perms: Vec<PermissionView>,
}

impl InMemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn perms(&self) -> &[PermissionView] {
        &self.perms
    }

    pub fn count(&self, kind: PermissionKind) -> usize {
        self.perms
            .iter()
            .filter(|p| p.permission_name == kind)
            .count()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissions {
    async fn merge_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<PermissionView> {
        if let Some(existing) = self.find_perm(kind, view_menu_name).await? {
            return Ok(existing);
        }
        let perm = PermissionView {
            id: Uuid::new_v4(),
            permission_name: kind,
            view_menu_name: view_menu_name.to_string(),
        };
        self.perms.push(perm.clone());
        Ok(perm)
    }

    async fn find_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name: &str,
    ) -> Result<Option<PermissionView>> {
        Ok(self
            .perms
            .iter()
            .find(|p| p.permission_name == kind && p.view_menu_name == view_menu_name)
            .cloned())
    }

    async fn delete_perm(&mut self, kind: PermissionKind, view_menu_name: &str) -> Result<usize> {
        let before = self.perms.len();
        self.perms
            .retain(|p| !(p.permission_name == kind && p.view_menu_name == view_menu_name));
        Ok(before - self.perms.len())
    }
}
