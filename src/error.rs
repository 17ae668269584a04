use crate::aggregation::AggregationError;
use crate::database::DatabaseError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(config::ConfigError),
    Database(DatabaseError),
    Aggregation(AggregationError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "Configuration error: {}", err),
            AppError::Database(err) => write!(f, "{}", err),
            AppError::Aggregation(err) => write!(f, "Aggregation failed: {}", err),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => AppError::NotFound("not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        AppError::Aggregation(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
            AppError::Database(_) | AppError::Aggregation(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        // Storage details stay in the log, not in the response
        let message = match &self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            other => {
                tracing::error!(error = %other, "Request failed");
                error_message.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let config_err = AppError::Config(config::ConfigError::NotFound("test".to_string()));
        assert!(config_err.to_string().contains("Configuration error"));

        let bad_request = AppError::BadRequest("price must be >= 0".to_string());
        assert_eq!(bad_request.to_string(), "price must be >= 0");

        let internal_err = AppError::Internal("test message".to_string());
        assert_eq!(internal_err.to_string(), "Internal error: test message");
    }

    #[test]
    fn test_database_not_found_maps_to_not_found() {
        let app_err: AppError = DatabaseError::NotFound.into();
        assert!(matches!(app_err, AppError::NotFound(_)));

        let app_err: AppError = DatabaseError::Database("boom".to_string()).into();
        assert!(matches!(app_err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response = AppError::BadRequest("service_name is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Bad request");
        assert_eq!(body["message"], "service_name is required");
    }

    #[tokio::test]
    async fn test_retrieval_failure_hides_details() {
        let err = AggregationError::Retrieval(DatabaseError::Database(
            "connection refused".to_string(),
        ));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AppError::NotFound("not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "not found");
    }
}
