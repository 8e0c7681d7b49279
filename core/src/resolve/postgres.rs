use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::QueryableByName;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use url::Url;

use crate::error::{ConnectorError, Result};
use crate::model::database::Database;

use super::{PhysicalColumn, PhysicalTable, TableResolver};

const DEFAULT_SCHEMA: &str = "public";

const COLUMNS_QUERY: &str = "SELECT column_name::text AS column_name, data_type::text AS data_type \
    FROM information_schema.columns \
    WHERE table_schema = $1 AND table_name = $2 \
    ORDER BY ordinal_position";

#[derive(QueryableByName, Debug)]
struct InformationSchemaColumn {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
}

/// Fails unless the connection uri points at a postgres server
pub fn check_backend(connection_uri: &str) -> Result<()> {
    let url = Url::parse(connection_uri)?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConnectorError::UnsupportedBackend(format!(
            "{other}, only postgres connections can be registered"
        ))),
    }
}

/// Provides [TableResolver] impl reading `information_schema` of a postgres [Database].
/// A new connection is established for every lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresResolver;

#[async_trait]
impl TableResolver for PostgresResolver {
    async fn resolve(
        &self,
        database: &Database,
        schema: Option<&str>,
        table_name: &str,
    ) -> Result<PhysicalTable> {
        check_backend(&database.connection_uri)?;
        let mut con = AsyncPgConnection::establish(&database.connection_uri).await?;
        let schema_name = schema.unwrap_or(DEFAULT_SCHEMA);
        debug!(
            "Reading columns of {schema_name}.{table_name} from {}",
            database.safe_uri()
        );

        let rows: Vec<InformationSchemaColumn> = sql_query(COLUMNS_QUERY)
            .bind::<Text, _>(schema_name)
            .bind::<Text, _>(table_name)
            .load(&mut con)
            .await?;

        // information_schema only lists tables the connected role can see
        if rows.is_empty() {
            return Err(ConnectorError::NotFound(format!(
                "{schema_name}.{table_name} in {}",
                database.database_name
            )));
        }

        Ok(PhysicalTable {
            schema: schema.map(|s| s.to_string()),
            table_name: table_name.to_string(),
            columns: rows
                .into_iter()
                .map(|r| PhysicalColumn {
                    name: r.column_name,
                    data_type: r.data_type.to_uppercase(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::check_backend;

    #[test]
    fn only_postgres_is_supported() {
        assert!(check_backend("postgresql://analyst@warehouse/sales").is_ok());
        assert!(check_backend("postgres://warehouse/sales").is_ok());

        let err = check_backend("mysql://warehouse/sales").expect_err("mysql is not supported");
        assert_eq!(
            "Unsupported database backend: mysql, only postgres connections can be registered",
            err.to_string()
        );
        assert!(check_backend("not a uri").expect_err("uri is invalid").is_form_error());
    }
}
