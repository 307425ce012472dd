//! Error kinds for the coordinator's public contract.

use thiserror::Error;

/// Severity hint used when deciding the log level for a surfaced error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

/// Metadata an HTTP layer needs to turn a [`CoreError`] into a response,
/// without the HTTP crate itself leaking into this crate.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;
    fn error_code(&self) -> &'static str;
    fn is_recoverable(&self) -> bool;
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("task {0} not found")]
    NotFound(String),

    #[error("invalid task id: {0}")]
    InvalidId(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("task execution failed: {0}")]
    Task(#[source] anyhow::Error),
}

impl ErrorMetadata for CoreError {
    fn http_status_code(&self) -> u16 {
        match self {
            CoreError::Config(_) => 500,
            CoreError::Store(_) => 500,
            CoreError::NotFound(_) => 404,
            CoreError::InvalidId(_) => 400,
            CoreError::Cancelled => 503,
            CoreError::Task(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "config_error",
            CoreError::Store(_) => "store_error",
            CoreError::NotFound(_) => "not_found",
            CoreError::InvalidId(_) => "invalid_id",
            CoreError::Cancelled => "cancelled",
            CoreError::Task(_) => "task_error",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::Store(_) | CoreError::Task(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            CoreError::NotFound(_) | CoreError::InvalidId(_) | CoreError::Cancelled => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let e = CoreError::NotFound("7".into());
        assert_eq!(e.http_status_code(), 404);
        assert_eq!(e.error_code(), "not_found");
        assert!(!e.is_recoverable());
    }

    #[test]
    fn store_error_is_recoverable_and_500() {
        let e = CoreError::Store(sqlx::Error::RowNotFound);
        assert_eq!(e.http_status_code(), 500);
        assert!(e.is_recoverable());
    }

    #[test]
    fn cancelled_maps_to_503_and_warn() {
        let e = CoreError::Cancelled;
        assert_eq!(e.http_status_code(), 503);
        assert_eq!(e.log_level(), LogLevel::Warn);
    }
}
