//! `rp-output` — append-only run logs for the ridepool dispatcher.
//!
//! Five files in the results directory, all opened in append mode:
//!
//! | File            | Contents                                            |
//! |-----------------|-----------------------------------------------------|
//! | `results.log`   | run header, per-epoch metric blocks, final summary  |
//! | `ilp.csv`       | one tab-separated row per assignment solve          |
//! | `actions.log`   | per-vehicle event trace                             |
//! | `rebalance.log` | per-epoch relocation targets                        |
//! | `rtv.log`       | optional per-epoch trip trace                       |
//!
//! Every writer sits behind its own mutex and each critical section writes
//! one prepared payload.  Writes are best-effort: a failed append is logged
//! and dropped, it never aborts an epoch.

pub mod error;
pub mod logs;

#[cfg(test)]
mod tests;

pub use error::{OutputError, OutputResult};
pub use logs::{IlpRow, RunLogs};
