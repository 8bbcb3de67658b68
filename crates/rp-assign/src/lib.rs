//! `rp-assign` — the per-epoch assignment pipeline of the ridepool
//! dispatcher.
//!
//! One call to [`pipeline::assignment`] runs the full chain for an epoch:
//!
//! 1. **RV** ([`rv`]) — per request, the vehicles that could serve it alone;
//! 2. **RR** ([`rr`]) — per request, the requests it could share a cabin
//!    with, probed on a synthetic empty vehicle;
//! 3. **RTV** ([`rtv`]) — per vehicle, feasible request cliques enumerated
//!    rank by rank, each costed by the routing oracle;
//! 4. **ILP** ([`ilp`]) — one trip per vehicle, minimizing cost plus miss
//!    penalties, with continuity for previously promised requests.
//!
//! The rebalancing LP for leftover idle vehicles lives in [`rebalance`] and
//! is merged by the epoch driver, not here.
//!
//! Infeasible routings never surface as errors — they simply don't become
//! edges or trips.  Errors from this crate are invariant violations (a
//! promised request dropped from its vehicle's trip list, a previous plan no
//! longer replayable) and are fatal by design.

pub mod error;
pub mod ilp;
pub mod pipeline;
pub mod rebalance;
pub mod rr;
pub mod rtv;
pub mod rv;


pub use error::{AssignError, AssignResult};
pub use ilp::SolverReport;
pub use pipeline::{assignment, AssignCtx};
