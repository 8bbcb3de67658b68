//! Error types for rp-assign.
//!
//! Everything here is an invariant violation or a solver breakdown — bugs
//! and environment failures, not operational outcomes.  Routing
//! infeasibility is data and never appears below.

use thiserror::Error;

/// Fatal conditions detected by the assignment pipeline.
#[derive(Debug, Error)]
pub enum AssignError {
    /// The empty baseline trip failed to cost — the onboard dropoffs of this
    /// vehicle no longer admit any ordering, which cannot happen if earlier
    /// epochs were consistent.
    #[error("vehicle {vehicle}: baseline trip infeasible")]
    BaselineInfeasible { vehicle: u32 },

    /// The previous assignment stopped replaying under memory mode.
    #[error("vehicle {vehicle}: previous assignment no longer feasible (pending requests: {pending:?})")]
    ContinuityLost { vehicle: u32, pending: Vec<u32> },

    /// A vehicle's trip list has no trip matching its pending request set.
    #[error("vehicle {vehicle}: no trip replicates its pending request set {pending:?}")]
    ContinuityMissing { vehicle: u32, pending: Vec<u32> },

    /// A previously promised request vanished from every trip list.
    #[error("request {request}: promised but absent from all trips and no vehicle holds it pending")]
    AssignedRequestDropped { request: u32 },

    /// A promised request is held pending by a vehicle whose trip list
    /// nevertheless does not contain it.
    #[error("request {request}: pending on vehicle {vehicle} but absent from its trips")]
    PendingRequestDropped { request: u32, vehicle: u32 },

    /// The MIP solver failed outright.  Infeasibility is impossible by
    /// construction (every vehicle has the baseline trip), so this is fatal.
    #[error("assignment solver failed: {0}")]
    Solver(String),
}

/// Alias for `Result<T, AssignError>`.
pub type AssignResult<T> = Result<T, AssignError>;
