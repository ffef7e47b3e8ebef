//! Error types shared by every component.
//!
//! One taxonomy covers the database helper, the notification helper and the
//! utility routines, so scripts can match on a single enum.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Toolkit error.
#[derive(Debug, Error)]
pub enum AppError {
    /// A remote endpoint (database, mail server, webhook) could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credentials were rejected by the remote endpoint.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Row shape does not match the target table.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value cannot be stored in its target column.
    #[error("data error: {0}")]
    Data(String),

    /// The query is malformed or was rejected by the database.
    #[error("query error: {0}")]
    Query(String),

    /// Caller input failed validation before any network traffic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The mail server or webhook failed mid-conversation.
    #[error("transport error: {0}")]
    Transport(String),

    /// A utility routine received an argument it cannot work with.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Returns a stable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::Schema(_) => "SCHEMA_ERROR",
            AppError::Data(_) => "DATA_ERROR",
            AppError::Query(_) => "QUERY_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::InvalidValue(_) => "INVALID_VALUE",
            AppError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
