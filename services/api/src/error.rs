//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use axum::http::StatusCode;
use qc_inspection_core::{PortError, SessionError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failed migration run at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a fixture or form file that could not be parsed.
    #[error("Data file error: {0}")]
    DataFile(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Maps a session error to the status code a handler should answer with.
pub fn session_error_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::NotLoaded => StatusCode::NOT_FOUND,
        SessionError::NoForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Incomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::AlreadySubmitted | SessionError::SubmitInProgress => StatusCode::CONFLICT,
        SessionError::Superseded => StatusCode::CONFLICT,
        SessionError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
        SessionError::Port(PortError::Unexpected(_)) => StatusCode::BAD_GATEWAY,
    }
}
