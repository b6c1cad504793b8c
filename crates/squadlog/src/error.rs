//! Error types for the logging core.

use thiserror::Error;

/// Errors that can occur in the logging core.
///
/// Level methods never surface these; they are returned from lifecycle
/// operations (`startup`, `flush`, `shutdown`) and interceptor construction.
#[derive(Debug, Error)]
pub enum LogError {
    /// An I/O error occurred while creating, opening, writing or syncing a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization of a log record failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File writing is switched off.
    #[error("log writing is disabled")]
    WritingDisabled,

    /// The writer has not been booted yet.
    #[error("logger not yet ready")]
    NotReady,

    /// A flush was attempted without an open file handle.
    #[error("no log file is open")]
    NoOpenFile,

    /// Interceptor options failed validation.
    #[error("invalid options: {field} {reason}")]
    InvalidOptions {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The background flush thread could not be started.
    #[error("failed to spawn flusher: {0}")]
    FlusherSpawn(String),
}

impl LogError {
    /// Creates an [`LogError::InvalidOptions`] for a required field that is empty.
    #[must_use]
    pub fn required(field: &'static str) -> Self {
        Self::InvalidOptions {
            field,
            reason: "is required".to_string(),
        }
    }
}

/// Result type alias for logging core operations.
pub type Result<T> = std::result::Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(LogError::WritingDisabled.to_string(), "log writing is disabled");
        assert_eq!(LogError::NotReady.to_string(), "logger not yet ready");
        assert_eq!(LogError::NoOpenFile.to_string(), "no log file is open");
        assert_eq!(
            LogError::required("token").to_string(),
            "invalid options: token is required"
        );
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LogError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogError>();
    }
}
