//! Error types for rp-model.

use thiserror::Error;

/// Errors from loading the fleet and request files.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Core(#[from] rp_core::CoreError),

    #[error("vehicle file error: {0}")]
    Vehicles(String),

    #[error("request file error: {0}")]
    Requests(String),
}

/// Alias for `Result<T, ModelError>`.
pub type ModelResult<T> = Result<T, ModelError>;
