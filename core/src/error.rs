use std::{error::Error, fmt, result};

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};

pub type Result<T, E = ConnectorError> = result::Result<T, E>;

#[derive(Debug)]
pub enum ConnectorError {
    Internal(String),
    DbError(String),
    SerDe(String),
    /// A record looked up by its identifier does not exist.
    NotFound(String),
    /// Carries the fully qualified name of the datasource which is already registered.
    DatasourceExists(String),
    /// Carries the name of the table which could not be resolved in the physical database.
    TableNotFound(String),
    UnsupportedBackend(String),
    InvalidForm(String),
}

impl ConnectorError {
    /// True for failures which should be reported back to the operator next to the
    /// submitted form rather than as a server fault.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::DatasourceExists(_)
                | ConnectorError::TableNotFound(_)
                | ConnectorError::UnsupportedBackend(_)
                | ConnectorError::InvalidForm(_)
        )
    }
}

impl Error for ConnectorError {}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectorError::Internal(s) => write!(f, "Unexpected internal error: {}", s),
            ConnectorError::DbError(s) => write!(f, "Database related error: {}", s),
            ConnectorError::SerDe(s) => write!(f, "SerDe related error: {}", s),
            ConnectorError::NotFound(s) => write!(f, "No record found: {}", s),
            ConnectorError::DatasourceExists(name) => {
                write!(f, "Datasource {} already exists", name)
            }
            ConnectorError::TableNotFound(name) => write!(
                f,
                "Table [{}] could not be found, please double check your \
                database connection, schema, and table name",
                name
            ),
            ConnectorError::UnsupportedBackend(s) => {
                write!(f, "Unsupported database backend: {}", s)
            }
            ConnectorError::InvalidForm(s) => write!(f, "Invalid form submission: {}", s),
        }
    }
}

impl From<diesel::result::Error> for ConnectorError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => ConnectorError::NotFound(e.to_string()),
            // e.g. a second column or metric with the same name on one table
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ConnectorError::InvalidForm(info.message().to_string())
            }
            _ => ConnectorError::DbError(e.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for ConnectorError {
    fn from(e: diesel::result::ConnectionError) -> Self {
        ConnectorError::DbError(e.to_string())
    }
}

impl From<url::ParseError> for ConnectorError {
    fn from(e: url::ParseError) -> Self {
        ConnectorError::InvalidForm(e.to_string())
    }
}

impl From<regex::Error> for ConnectorError {
    fn from(e: regex::Error) -> Self {
        ConnectorError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::SerDe(e.to_string())
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        ConnectorError::SerDe(e.to_string())
    }
}
