//! Error types shared by the service crates.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the services.
pub type AppResult<T> = Result<T, AppError>;

/// Failure to establish the document store session.
///
/// Every kind is fatal: the process entry point terminates once one is
/// reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection target could not be parsed or resolved.
    #[error("invalid connection target: {0}")]
    InvalidTarget(String),

    /// The server rejected the supplied credential.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// The server could not be reached or selected.
    #[error("database unreachable: {0}")]
    Unreachable(String),

    /// Establishment did not finish within the configured bound.
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

impl From<mongodb::error::Error> for ConnectionError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::Authentication { .. } => Self::Authentication(err.to_string()),
            ErrorKind::InvalidArgument { .. } | ErrorKind::DnsResolve { .. } => {
                Self::InvalidTarget(err.to_string())
            }
            _ => Self::Unreachable(err.to_string()),
        }
    }
}

/// Application level error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    /// Stable error code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseQuery(err.to_string())
    }
}
