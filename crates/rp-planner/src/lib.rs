//! `rp-planner` — the routing oracle of the ridepool dispatcher.
//!
//! Given a vehicle and a set of requests, [`plan_route`] either proves the
//! combination infeasible or returns the cheapest ordered stop plan that
//! serves everyone within their windows.  Infeasibility is a normal return
//! value (`None`), never an error: every caller in the assignment pipeline
//! treats it as first-class data.
//!
//! The oracle is a depth-first branch-and-bound over stop permutations
//! ([`search`]), driven by a precedence graph over the stop universe
//! ([`universe`]): visiting a stop *unlocks* its successors, and only
//! unlocked stops may be visited.  Plain pickup-before-dropoff precedence,
//! the onboard-dropoff chain of `FIX_ONBOARD`, the frozen prefix of
//! `FIX_PREFIX` and the full replay of memory mode are all just different
//! unlock wirings fed to the same search.

pub mod plan;
mod search;
mod universe;

#[cfg(test)]
mod tests;

pub use plan::{plan_route, PlanCtx, PlanMode, RoutePlan};
