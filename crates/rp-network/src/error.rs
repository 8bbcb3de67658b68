//! Error types for rp-network.

use rp_core::NodeId;
use thiserror::Error;

/// Errors from loading or querying the road network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("travel-time matrix error: {0}")]
    Matrix(String),

    #[error("edge list error: {0}")]
    Edges(String),

    #[error("no on-road path from {origin} to {destination}")]
    NoPath { origin: NodeId, destination: NodeId },
}

/// Alias for `Result<T, NetworkError>`.
pub type NetworkResult<T> = Result<T, NetworkError>;
