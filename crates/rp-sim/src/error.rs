//! Error types for rp-sim.

use rp_network::NetworkError;
use thiserror::Error;

/// Fatal conditions in the simulation layer.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Assign(#[from] rp_assign::AssignError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A trip that was feasible when chosen failed to re-plan at execution
    /// time — a planner/simulator consistency bug.
    #[error("vehicle {vehicle}: chosen trip no longer plans")]
    PlanVanished { vehicle: u32 },

    /// Last-minute service computed a departure in the past, meaning the
    /// plan was already violating a window when the epoch started.
    #[error("vehicle {vehicle}: negative idle delay under last-minute service")]
    LateStart { vehicle: u32 },
}

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
