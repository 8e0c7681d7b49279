use std::env;

/// Initializes and Holds envrionment variable settings which
/// control system behavior. Panics if any required setting
/// is not set.
#[derive(Debug)]
pub struct EnvConfigSettings {
    pub rest_url: String,
    pub rest_port: u16,
    pub db_url: String,
    /// Database connection registered at startup, if both name and uri are configured.
    pub default_database: Option<DefaultDatabase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultDatabase {
    pub database_name: String,
    pub connection_uri: String,
}

impl EnvConfigSettings {
    pub fn init() -> Self {
        let rest_url = env::var("REST_SERVICE_URL").expect("REST_SERVICE_URL must be set");
        let rest_port = env::var("REST_SERVICE_PORT")
            .expect("REST_SERVICE_PORT must be set")
            .parse::<u16>()
            .expect("Unable to parse REST_SERVICE_PORT as a port");
        let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let default_database = default_database_from(
            env::var("DEFAULT_DATABASE_NAME").ok(),
            env::var("DEFAULT_DATABASE_URI").ok(),
        );

        Self {
            rest_url,
            rest_port,
            db_url,
            default_database,
        }
    }
}

fn default_database_from(
    name: Option<String>,
    uri: Option<String>,
) -> Option<DefaultDatabase> {
    match (name, uri) {
        (Some(database_name), Some(connection_uri)) => Some(DefaultDatabase {
            database_name,
            connection_uri,
        }),
        (Some(_), None) => panic!("DEFAULT_DATABASE_URI must be set when DEFAULT_DATABASE_NAME is set"),
        (None, Some(_)) => panic!("DEFAULT_DATABASE_NAME must be set when DEFAULT_DATABASE_URI is set"),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_requires_both_values() {
        assert_eq!(None, default_database_from(None, None));
        assert_eq!(
            Some(DefaultDatabase {
                database_name: "examples".to_string(),
                connection_uri: "postgresql://localhost/examples".to_string(),
            }),
            default_database_from(
                Some("examples".to_string()),
                Some("postgresql://localhost/examples".to_string())
            )
        );
    }

    #[test]
    #[should_panic(expected = "DEFAULT_DATABASE_URI must be set")]
    fn default_database_name_without_uri_panics() {
        default_database_from(Some("examples".to_string()), None);
    }
}
