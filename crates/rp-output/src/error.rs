//! Error types for rp-output.

use thiserror::Error;

/// Errors opening the log files.  Write-time failures are swallowed with a
/// warning instead — logging must never take the run down.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
