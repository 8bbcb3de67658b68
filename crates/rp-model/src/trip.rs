//! Candidate trips: a request set plus the stop sequence that realizes it.

use rp_core::{NodeId, RequestId, Seconds};

use crate::stop::NodeStop;

/// How a trip was produced, which also tells the simulator how to replay it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TripKind {
    /// Planned afresh by the routing oracle.
    Standard,
    /// Replay of the vehicle's previous plan (continuity trip).
    Memory,
    /// Relocation of an idle vehicle toward `target`.  When matched to an
    /// unserved request the trip carries that request, but only as the
    /// source of the target node — it is not served.
    Rebalance { target: NodeId },
}

/// One candidate trip for one vehicle.
///
/// `requests` is sorted and duplicate-free.  Every request has exactly two
/// stops in `stops` unless it is already onboard (then only its dropoff).
/// Only feasible trips exist — infeasibility is an oracle return value and
/// never becomes a `Trip`.
#[derive(Clone, Debug)]
pub struct Trip {
    pub requests: Vec<RequestId>,
    pub stops: Vec<NodeStop>,
    pub cost: Seconds,
    pub kind: TripKind,
}

impl Trip {
    /// The baseline trip serving nobody new: just the vehicle's onboard
    /// dropoffs, re-costed.  Always present in an RTV trip list.
    pub fn baseline(stops: Vec<NodeStop>, cost: Seconds) -> Self {
        Trip {
            requests: Vec::new(),
            stops,
            cost,
            kind: TripKind::Standard,
        }
    }
}
