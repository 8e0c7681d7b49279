use crate::error::Result;
use crate::model::column::{NewTableColumn, TableColumn};
use crate::model::database::Database;
use crate::model::metric::{NewSqlMetric, SqlMetric};
use crate::model::table::{NewSqlaTable, SqlaTable, TableEdit, TableSearch};

use crate::schema::{self, sql_metrics, table_columns, tables};
use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*, update};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::{DatasourceStore, PgDb};

impl<'a> PgDb<'a> {
    /// Tables matching every value set in `search`, most recently changed first
    pub async fn list_tables(&mut self, search: &TableSearch) -> Result<Vec<SqlaTable>> {
        let mut query = tables::table.into_boxed();
        if let Some(database_id_val) = &search.database_id {
            query = query.filter(tables::database_id.eq(*database_id_val));
        }
        if let Some(schema_val) = &search.schema {
            query = query.filter(tables::schema.eq(schema_val.clone()));
        }
        if let Some(table_name_val) = &search.table_name {
            query = query.filter(tables::table_name.eq(table_name_val.clone()));
        }
        Ok(query
            .order(tables::changed_on.desc())
            .select(SqlaTable::as_select())
            .load(&mut self.con)
            .await?)
    }
}

#[async_trait]
impl<'a> DatasourceStore for PgDb<'a> {
    async fn get_database(&mut self, id_val: &Uuid) -> Result<Database> {
        use schema::dbs::dsl::*;
        Ok(dbs
            .filter(id.eq(id_val))
            .select(Database::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    async fn count_tables(
        &mut self,
        table_name_val: &str,
        schema_val: Option<&str>,
        database_id_val: &Uuid,
    ) -> Result<i64> {
        let mut query = tables::table
            .filter(tables::table_name.eq(table_name_val.to_string()))
            .filter(tables::database_id.eq(*database_id_val))
            .into_boxed();
        query = match schema_val {
            Some(s) => query.filter(tables::schema.eq(s.to_string())),
            None => query.filter(tables::schema.is_null()),
        };
        Ok(query.count().get_result(&mut self.con).await?)
    }

    async fn create_table(&mut self, val: &NewSqlaTable) -> Result<SqlaTable> {
        Ok(insert_into(tables::table)
            .values(val)
            .get_result(&mut self.con)
            .await?)
    }

    async fn get_table(&mut self, id_val: &Uuid) -> Result<SqlaTable> {
        Ok(tables::table
            .filter(tables::id.eq(id_val))
            .select(SqlaTable::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    async fn update_table(&mut self, id_val: &Uuid, val: &TableEdit) -> Result<SqlaTable> {
        Ok(update(tables::table.filter(tables::id.eq(id_val)))
            .set((val, tables::changed_on.eq(diesel::dsl::now)))
            .get_result(&mut self.con)
            .await?)
    }

    // columns and metrics are removed by cascade
    async fn delete_table(&mut self, id_val: &Uuid) -> Result<usize> {
        Ok(delete(tables::table.filter(tables::id.eq(id_val)))
            .execute(&mut self.con)
            .await?)
    }

    async fn set_table_perm(&mut self, id_val: &Uuid, perm_val: &str) -> Result<()> {
        update(tables::table.filter(tables::id.eq(id_val)))
            .set(tables::perm.eq(perm_val))
            .execute(&mut self.con)
            .await?;
        Ok(())
    }

    async fn set_main_dttm_col(&mut self, id_val: &Uuid, column_name_val: &str) -> Result<()> {
        update(tables::table.filter(tables::id.eq(id_val)))
            .set(tables::main_dttm_col.eq(column_name_val))
            .execute(&mut self.con)
            .await?;
        Ok(())
    }

    async fn get_columns(&mut self, table_id_val: &Uuid) -> Result<Vec<TableColumn>> {
        Ok(table_columns::table
            .filter(table_columns::table_id.eq(table_id_val))
            .order(table_columns::column_name.asc())
            .select(TableColumn::as_select())
            .load(&mut self.con)
            .await?)
    }

    async fn create_column(&mut self, val: &NewTableColumn) -> Result<TableColumn> {
        Ok(insert_into(table_columns::table)
            .values(val)
            .get_result(&mut self.con)
            .await?)
    }

    async fn set_column_type(&mut self, id_val: &Uuid, column_type_val: &str) -> Result<()> {
        update(table_columns::table.filter(table_columns::id.eq(id_val)))
            .set(table_columns::column_type.eq(column_type_val))
            .execute(&mut self.con)
            .await?;
        Ok(())
    }

    async fn get_metrics(&mut self, table_id_val: &Uuid) -> Result<Vec<SqlMetric>> {
        Ok(sql_metrics::table
            .filter(sql_metrics::table_id.eq(table_id_val))
            .order(sql_metrics::metric_name.asc())
            .select(SqlMetric::as_select())
            .load(&mut self.con)
            .await?)
    }

    async fn get_metric(&mut self, id_val: &Uuid) -> Result<SqlMetric> {
        Ok(sql_metrics::table
            .filter(sql_metrics::id.eq(id_val))
            .select(SqlMetric::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    async fn create_metric(&mut self, val: &NewSqlMetric) -> Result<SqlMetric> {
        Ok(insert_into(sql_metrics::table)
            .values(val)
            .get_result(&mut self.con)
            .await?)
    }

    async fn update_metric(&mut self, id_val: &Uuid, val: &NewSqlMetric) -> Result<SqlMetric> {
        Ok(update(sql_metrics::table.filter(sql_metrics::id.eq(id_val)))
            .set(val)
            .get_result(&mut self.con)
            .await?)
    }

    async fn delete_metric(&mut self, id_val: &Uuid) -> Result<usize> {
        Ok(delete(sql_metrics::table.filter(sql_metrics::id.eq(id_val)))
            .execute(&mut self.con)
            .await?)
    }
}
