//! `rp-core` — foundational types for the `ridepool` dispatcher.
//!
//! This crate is a dependency of every other `rp-*` crate.  It intentionally
//! has no `rp-*` dependencies and a single external one (`thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`ids`]     | `RequestId`, `VehicleId`, `NodeId`                      |
//! | [`clock`]   | `Seconds`, `HHMMSS` codec, request-file clock parser    |
//! | [`config`]  | `Settings` plus the mode enums and compile-time tunables|
//! | [`error`]   | `CoreError`, `CoreResult`                               |

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use clock::{decode_hms, encode_hms, parse_clock, Seconds};
pub use config::{
    Algorithm, AssignmentObjective, CtspMode, CtspObjective, Settings, LP_LIMITVALUE, MISS_COST,
    PRUNING_RR_K, PRUNING_RV_K, REBALANCE_RELGAP, REBALANCE_TIMELIMIT, RMT_REWARD,
};
pub use error::{CoreError, CoreResult};
pub use ids::{NodeId, RequestId, VehicleId};
