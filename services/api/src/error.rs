//! services/api/src/error.rs
//!
//! Defines the error types of the API service: `ApiError` for startup failures
//! and `ErrorReply` for failures returned to HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use course_core::{CourseError, GenerationError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//=========================================================================================
// Request Errors
//=========================================================================================

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request: a status code plus a message safe to show the client.
#[derive(Debug)]
pub struct ErrorReply {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorReply {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<CourseError> for ErrorReply {
    fn from(e: CourseError) -> Self {
        match e {
            CourseError::Validation(message) => Self::bad_request(message),
            CourseError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "Course not found or access denied.")
            }
            CourseError::GenerationFailed(cause) => {
                error!("Generation failed: {}", cause);
                let reason = match cause {
                    GenerationError::Malformed { .. } => "the AI returned an unreadable response",
                    GenerationError::Incomplete { .. } => "the AI returned an incomplete response",
                    GenerationError::Upstream(_) => "the AI service is unavailable",
                    GenerationError::TimedOut(_) => "the AI service took too long to respond",
                };
                Self::internal(format!("Generation failed: {}.", reason))
            }
            CourseError::Storage(cause) => {
                error!("Storage failure: {}", cause);
                Self::internal("An internal storage error occurred.")
            }
        }
    }
}
