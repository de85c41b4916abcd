//! Crate-wide error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::validation::Violation;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path id that is not a positive integer.
    #[error("Invalid test ID")]
    InvalidId(String),

    /// Malformed request outside of field validation (query params, non-object body).
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Validation failed: {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Test not found")]
    TestNotFound { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidId(_) | Error::InvalidRequest(_) | Error::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::TestNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Migration(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing `error` value. Server-side failures never leak detail.
    fn body(&self) -> serde_json::Value {
        match self {
            Error::Validation(violations) => json!({ "error": violations }),
            Error::InvalidId(_)
            | Error::InvalidRequest(_)
            | Error::PayloadTooLarge
            | Error::TestNotFound { .. } => json!({ "error": self.to_string() }),
            Error::Database(_) | Error::Migration(_) | Error::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
