use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::schema::dbs;

/// A connection to a customer database which hosts the physical tables that
/// [SqlaTable][crate::model::table::SqlaTable]s are registered against.
#[derive(
    Serialize, Deserialize, Queryable, Selectable, Identifiable, Debug, PartialEq, Eq, Hash, Clone,
)]
#[diesel(table_name = dbs)]
pub struct Database {
    pub id: Uuid,
    pub database_name: String,
    pub connection_uri: String,
}

impl Database {
    /// Connection uri with any password replaced by `XXXXXXXXXX`, suitable for
    /// showing in list views and logs. Returns the raw value if it cannot be parsed.
    pub fn safe_uri(&self) -> String {
        match Url::parse(&self.connection_uri) {
            Ok(mut url) => {
                if url.password().is_some() {
                    // set_password only fails for cannot-be-a-base urls, which have no password
                    let _ = url.set_password(Some("XXXXXXXXXX"));
                }
                url.to_string()
            }
            Err(_) => self.connection_uri.clone(),
        }
    }
}

/// Used to create a new [Database] object in the database
#[derive(Deserialize, Insertable, Debug, PartialEq, AsChangeset, Clone)]
#[diesel(table_name = dbs)]
pub struct NewDatabase {
    pub database_name: String,
    pub connection_uri: String,
}

/// What list views show for a [Database]
#[derive(Serialize, Debug, PartialEq)]
pub struct DatabaseListing {
    pub id: Uuid,
    pub database_name: String,
    pub connection_uri: String,
}

impl From<&Database> for DatabaseListing {
    fn from(db: &Database) -> Self {
        Self {
            id: db.id,
            database_name: db.database_name.clone(),
            connection_uri: db.safe_uri(),
        }
    }
}
