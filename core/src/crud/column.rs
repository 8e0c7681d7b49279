use crate::error::Result;
use crate::model::column::{NewTableColumn, TableColumn};

use crate::schema::table_columns;
use diesel::{prelude::*, update};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::PgDb;

impl<'a> PgDb<'a> {
    pub async fn get_column(&mut self, id_val: &Uuid) -> Result<TableColumn> {
        Ok(table_columns::table
            .filter(table_columns::id.eq(id_val))
            .select(TableColumn::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    pub async fn update_column(
        &mut self,
        id_val: &Uuid,
        val: &NewTableColumn,
    ) -> Result<TableColumn> {
        Ok(update(table_columns::table.filter(table_columns::id.eq(id_val)))
            .set(val)
            .get_result(&mut self.con)
            .await?)
    }
}
