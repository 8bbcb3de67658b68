//! Fleet vehicles and their kinematic state accounting.

use rp_core::{NodeId, RequestId, Seconds};
use rp_network::{Leg, Network};

use crate::stop::NodeStop;

/// Capacity of the synthetic probe vehicle used for pairwise request checks.
const PROBE_CAPACITY: usize = 4;

/// Kinematic state, tracked for per-state time totals.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VehicleState {
    Idle,
    Rebalancing,
    EnRoute,
    InUse,
    Boarding,
}

/// A fleet vehicle.
///
/// Position is the road segment `(prev, node, offset)`: the vehicle reaches
/// `node` after `offset` more seconds, having come from `prev`.  `prev` is a
/// [`Leg`] because an interrupted dwell or wait leaves the vehicle "coming
/// from" a service pseudo-leg rather than a road node.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// External id from the fleet file; used only in log output.
    pub id: u32,
    pub capacity: usize,

    pub prev: Leg,
    pub node: NodeId,
    /// Seconds remaining to reach `node`; 0 ≤ offset ≤ time(prev, node).
    pub offset: Seconds,

    /// Riders currently in the cabin.  `passengers.len() <= capacity`.
    pub passengers: Vec<RequestId>,
    /// Assigned but not yet picked up.
    pub pending: Vec<RequestId>,
    /// Remaining ordered plan from the last assignment.
    pub plan: Vec<NodeStop>,
    /// Relocation destination while rebalancing.
    pub rebalance_target: Option<NodeId>,

    state: VehicleState,
    state_since: Seconds,
    total_idle: Seconds,
    total_rebalancing: Seconds,
    total_enroute: Seconds,
    total_inuse: Seconds,

    total_distance: f64,
    rebalance_distance: f64,
}

impl Vehicle {
    pub fn new(id: u32, capacity: usize, node: NodeId) -> Self {
        Vehicle {
            id,
            capacity,
            prev: Leg::Node(node),
            node,
            offset: 0,
            passengers: Vec::new(),
            pending: Vec::new(),
            plan: Vec::new(),
            rebalance_target: None,
            state: VehicleState::Idle,
            state_since: 0,
            total_idle: 0,
            total_rebalancing: 0,
            total_enroute: 0,
            total_inuse: 0,
            total_distance: 0.0,
            rebalance_distance: 0.0,
        }
    }

    /// An empty probe vehicle parked at `node`, used to test whether two
    /// requests can share a cabin at all.
    pub fn probe(node: NodeId) -> Self {
        Vehicle::new(0, PROBE_CAPACITY, node)
    }

    /// Time to reach `node` from the current position: finish the current
    /// segment, then drive from `self.node`.
    #[inline]
    pub fn time_to(&self, network: &Network, node: NodeId) -> Seconds {
        self.offset + network.node_time(self.node, node)
    }

    // ── Distance accounting ───────────────────────────────────────────────

    /// Credit distance travelled; attributed to rebalancing while in that
    /// state.
    pub fn add_distance(&mut self, distance: f64) {
        self.total_distance += distance;
        if self.state == VehicleState::Rebalancing {
            self.rebalance_distance += distance;
        }
    }

    pub fn distance_traveled(&self) -> f64 {
        self.total_distance
    }

    pub fn rebalance_distance(&self) -> f64 {
        self.rebalance_distance
    }

    // ── State accounting ──────────────────────────────────────────────────

    /// Switch kinematic state, folding the elapsed stretch into the totals.
    /// No-op if the state is unchanged.
    pub fn set_state(&mut self, state: VehicleState, now: Seconds) {
        if state == self.state {
            return;
        }
        let elapsed = now - self.state_since;
        match self.state {
            VehicleState::Idle => self.total_idle += elapsed,
            VehicleState::EnRoute => self.total_enroute += elapsed,
            VehicleState::InUse => self.total_inuse += elapsed,
            VehicleState::Rebalancing | VehicleState::Boarding => {
                self.total_rebalancing += elapsed
            }
        }
        self.state = state;
        self.state_since = now;
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Total seconds spent in `state`, counting the open stretch up to `now`.
    pub fn total_in_state(&self, state: VehicleState, now: Seconds) -> Seconds {
        let base = match state {
            VehicleState::Idle => self.total_idle,
            VehicleState::EnRoute => self.total_enroute,
            VehicleState::InUse => self.total_inuse,
            VehicleState::Rebalancing | VehicleState::Boarding => self.total_rebalancing,
        };
        if self.state == state {
            base + (now - self.state_since)
        } else {
            base
        }
    }
}
