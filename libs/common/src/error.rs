//! Custom error types for the common library
//!
//! This module defines the database setup errors and the HTTP-facing error
//! shared by every service router.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing credentials on a protected route
    #[error("Access denied")]
    Unauthorized,

    /// A bearer token was supplied but could not be verified
    #[error("Invalid token")]
    InvalidToken,

    /// Validation failure with a client-facing message
    #[error("{0}")]
    BadRequest(String),

    /// A referenced user or video does not exist
    #[error("{0}")]
    NotFound(String),

    /// Anything else; the cause is logged and never sent to the client
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Shorthand for a `BadRequest` with a borrowed message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Shorthand for a `NotFound` with a borrowed message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<SqlxError> for ApiError {
    fn from(err: SqlxError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::bad_request("Expected a JSON request body")
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match &self {
            ApiError::Internal(cause) => {
                tracing::error!("Internal server error: {:#}", cause);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` extractor whose rejections render as [`ApiError`] bodies
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::bad_request("Comment cannot be empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("Video not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let response = ApiError::from(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<serde_json::Value, ApiError> {
        let mut request = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            request = request.header(axum::http::header::CONTENT_TYPE, content_type);
        }
        let request = request.body(axum::body::Body::from(body)).unwrap();

        ApiJson::<serde_json::Value>::from_request(request, &())
            .await
            .map(|ApiJson(value)| value)
    }

    #[tokio::test]
    async fn test_json_body_is_extracted() {
        let value = extract(Some("application/json"), r#"{"text":"hi"}"#).await.unwrap();
        assert_eq!(value["text"], "hi");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let err = extract(None, r#"{"text":"hi"}"#).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Expected a JSON request body");
    }

    #[tokio::test]
    async fn test_malformed_json_renders_error_body() {
        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().is_some_and(|message| !message.is_empty()));
    }

    #[test]
    fn test_migration_error_becomes_internal() {
        let err: ApiError = DatabaseError::Migration("checksum mismatch".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
