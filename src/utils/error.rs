//! Error types and handling
//!
//! All handler errors are converted to the wire format `{"error": "<message>"}`.
//! Provisioning and datastore detail is collapsed to generic server errors
//! at the API boundary so datastore internals never leak to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// No or invalid session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Profile or organization missing post-provisioning (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation surfaced to the client (409). Provisioning
    /// absorbs its own conflicts; this remains for other write paths.
    #[error("{0}")]
    Conflict(String),

    /// Any other datastore or internal failure (500)
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Error response body: `{"error": "<message>"}`
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, should_log) = match &self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            AppError::Conflict(_) => (StatusCode::CONFLICT, false),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, true),
        };

        if should_log {
            error!(error = %self, "Request error");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::Internal("Database error".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
