//! `rp-sim` — the discrete-time layer of the ridepool dispatcher.
//!
//! [`driver::run`] owns the epoch loop: ingest newly arrived requests, run
//! the assignment pipeline, rebalance the leftovers, advance every vehicle
//! one interval, and roll the statistics.  [`kinematics`] is the per-vehicle
//! advance: it executes the chosen trip's stop sequence along the road
//! graph, charging waits and dwells exactly the way the planner predicted
//! them, and carries interrupted movement across epochs in the vehicle's
//! segment offset.
//!
//! The advance runs fork-join parallel over vehicles.  Workers only read
//! the request arena; rider timestamps and shared flags are emitted as
//! [`kinematics::StepOutcome`] events and applied sequentially afterwards,
//! so the parallel phase is free of write contention.

pub mod driver;
pub mod error;
pub mod kinematics;
pub mod stats;

#[cfg(test)]
mod tests;

pub use driver::run;
pub use error::{SimError, SimResult};
