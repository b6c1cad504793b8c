//! CLI error types.

use squadlog::LogError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The logging core rejected an operation.
    #[error("logging error: {0}")]
    Logging(#[from] LogError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A worker task failed.
    #[error("worker failed: {0}")]
    Worker(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
