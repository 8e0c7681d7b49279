use crate::error::Result;
use crate::model::database::{Database, NewDatabase};

use crate::schema;
use diesel::{insert_into, prelude::*};
use diesel_async::RunQueryDsl;

use super::PgDb;

impl<'a> PgDb<'a> {
    pub async fn create_database(&mut self, val: &NewDatabase) -> Result<Database> {
        use schema::dbs::dsl::*;
        Ok(insert_into(dbs)
            .values(val)
            .get_result(&mut self.con)
            .await?)
    }

    /// Creates a new [Database] or updates its connection uri based on the database_name
    pub async fn upsert_database(&mut self, val: &NewDatabase) -> Result<Database> {
        use schema::dbs::dsl::*;
        insert_into(dbs)
            .values(val)
            .on_conflict(database_name)
            .do_update()
            .set(val)
            .execute(&mut self.con)
            .await?;
        Ok(dbs
            .filter(database_name.eq(&val.database_name))
            .select(Database::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    pub async fn list_databases(&mut self) -> Result<Vec<Database>> {
        use schema::dbs::dsl::*;
        Ok(dbs
            .order(database_name.asc())
            .select(Database::as_select())
            .load(&mut self.con)
            .await?)
    }
}
