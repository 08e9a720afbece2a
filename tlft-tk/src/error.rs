//! Error types for tlft-tk

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tlft_common::api::types::ErrorResponse;

/// API error type
///
/// Wraps the shared taxonomy and maps each kind to a stable machine-readable
/// code and HTTP status. Validation and authorization failures are raised
/// before any storage mutation is attempted.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request fields (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Uniqueness or duplicate-state violation (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Workflow rule violation (422)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Actor not permitted (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Deletion blocked by dependents (409)
    #[error("Dependency exists: {message}")]
    DependencyExists {
        message: String,
        examples: Vec<String>,
        remaining: i64,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<tlft_common::Error> for ApiError {
    fn from(err: tlft_common::Error) -> Self {
        use tlft_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::InvalidOperation(msg) => ApiError::InvalidOperation(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::DependencyExists {
                message,
                examples,
                remaining,
            } => ApiError::DependencyExists {
                message,
                examples,
                remaining,
            },
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Database(e) => ApiError::Internal(format!("database error: {e}")),
            Error::Io(e) => ApiError::Internal(format!("io error: {e}")),
            Error::Config(msg) => ApiError::Internal(format!("config error: {msg}")),
            Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(format!("database error: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::InvalidOperation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_OPERATION",
                msg,
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
            ApiError::DependencyExists {
                message,
                examples,
                remaining,
            } => (
                StatusCode::CONFLICT,
                "DEPENDENCY_EXISTS",
                message,
                Some(json!({
                    "examples": examples,
                    "remaining": remaining,
                })),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
                None,
            ),
        };

        let body = match details {
            Some(details) => ErrorResponse::with_details(error_code, message, details),
            None => ErrorResponse::new(error_code, message),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
