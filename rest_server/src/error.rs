use std::{error::Error, fmt};

use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use serde_json::json;
use sqla::error::ConnectorError;
use tracing::{error, info};

pub(crate) type Result<T, E = AdminError> = std::result::Result<T, E>;

#[derive(Debug)]
pub(crate) struct AdminError {
    pub(crate) msg: String,
    pub(crate) status: StatusCode,
}

impl Error for AdminError {}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Admin server error ({}): {}", self.status, self.msg)
    }
}

impl error::ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({ "error": self.msg }))
    }
}

impl From<ConnectorError> for AdminError {
    fn from(e: ConnectorError) -> Self {
        let status = if e.is_form_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(e, ConnectorError::NotFound(_)) {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!("Admin server returning ConnectorError to caller: {e}");
        } else {
            info!("Rejected admin request: {e}");
        }
        AdminError {
            msg: e.to_string(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn maps_connector_errors_to_status() {
        let exists: AdminError =
            ConnectorError::DatasourceExists("[db1].[public].[sales]".to_string()).into();
        assert_eq!(StatusCode::BAD_REQUEST, exists.status_code());

        let missing: AdminError = ConnectorError::TableNotFound("ghost_table".to_string()).into();
        assert_eq!(StatusCode::BAD_REQUEST, missing.status_code());

        let not_found: AdminError = ConnectorError::NotFound("table".to_string()).into();
        assert_eq!(StatusCode::NOT_FOUND, not_found.status_code());

        let db: AdminError = ConnectorError::DbError("connection reset".to_string()).into();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, db.status_code());
    }

    #[actix_web::test]
    async fn error_body_carries_message() {
        let err: AdminError =
            ConnectorError::DatasourceExists("[db1].[public].[sales]".to_string()).into();
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json!({ "error": "Datasource [db1].[public].[sales] already exists" }),
            body
        );
    }
}
