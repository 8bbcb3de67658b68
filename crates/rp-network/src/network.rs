//! Dense travel-time matrix plus road adjacency.

use std::collections::HashMap;
use std::collections::VecDeque;

use rp_core::{NodeId, Seconds};

use crate::error::{NetworkError, NetworkResult};

/// Upper bound on greedy-walk steps before declaring the adjacency broken.
const WALK_STEP_LIMIT: usize = 200;

// ── Leg ───────────────────────────────────────────────────────────────────────

/// Where a travel-time query starts.
///
/// Besides real matrix nodes, a vehicle can be "coming from" a service dwell
/// or a hold at a pickup point; these contribute a fixed time independent of
/// the destination.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Leg {
    /// A real road node.
    Node(NodeId),
    /// Boarding batch just ended; costs the pickup dwell.
    PickupDwell,
    /// Alighting batch just ended; costs the alight dwell.
    AlightDwell,
    /// Waiting in place for an early pickup; costs nothing.
    Hold,
}

// ── Network ───────────────────────────────────────────────────────────────────

/// A directed edge of the road graph.
#[derive(Copy, Clone, Debug)]
pub struct Arc {
    pub target: NodeId,
    pub time: Seconds,
}

/// Travel times and topology, immutable for the lifetime of a run.
///
/// Distances are deliberately equal to travel times: the reference data set
/// ships no usable distance matrix, so every "distance" in the pipeline is
/// vehicle-seconds.  [`Network::distance`] exists to mark the call sites
/// that would switch over if one appeared.
pub struct Network {
    times: Vec<Vec<Seconds>>,
    adjacency: Vec<Vec<Arc>>,
    dwell_pickup: Seconds,
    dwell_alight: Seconds,
}

impl Network {
    /// Assemble from pre-parsed parts.  Use [`crate::load`] for files.
    pub fn new(
        times: Vec<Vec<Seconds>>,
        adjacency: Vec<Vec<Arc>>,
        dwell_pickup: Seconds,
        dwell_alight: Seconds,
    ) -> Self {
        Network {
            times,
            adjacency,
            dwell_pickup,
            dwell_alight,
        }
    }

    pub fn node_count(&self) -> usize {
        self.times.len()
    }

    // ── Travel-time queries ───────────────────────────────────────────────

    /// Travel time from `from` to the road node `to`.
    #[inline]
    pub fn time(&self, from: Leg, to: NodeId) -> Seconds {
        match from {
            Leg::Node(a) => self.times[a.index()][to.index()],
            Leg::PickupDwell => self.dwell_pickup,
            Leg::AlightDwell => self.dwell_alight,
            Leg::Hold => 0,
        }
    }

    /// Travel time between two road nodes.
    #[inline]
    pub fn node_time(&self, a: NodeId, b: NodeId) -> Seconds {
        self.times[a.index()][b.index()]
    }

    /// Distance from `from` to `to` — currently travel time, see type docs.
    #[inline]
    pub fn distance(&self, from: Leg, to: NodeId) -> Seconds {
        self.time(from, to)
    }

    // ── On-road path reconstruction ───────────────────────────────────────

    /// The node sequence a vehicle traces from `origin` to `destination`,
    /// both inclusive.
    ///
    /// Greedy walk guided by the matrix: at each node take the outgoing arc
    /// that strictly improves `arc.time + time(arc.target, destination)`.
    /// When only zero-time arcs stay on a shortest path (merged
    /// intersections), a breadth-first sweep over the zero-time fringe finds
    /// the first arc that makes real progress.  Fails if the adjacency is
    /// inconsistent with the matrix.
    pub fn walk_path(&self, origin: NodeId, destination: NodeId) -> NetworkResult<Vec<NodeId>> {
        let mut path = vec![origin];
        let mut here = origin;
        let mut steps = 0;

        while here != destination {
            if steps >= WALK_STEP_LIMIT {
                return Err(NetworkError::NoPath {
                    origin,
                    destination,
                });
            }
            steps += 1;

            let next = self
                .strict_step(here, destination)
                .or_else(|| self.zero_fringe_step(here, destination, &mut path));

            match next {
                Some(node) => {
                    path.push(node);
                    here = node;
                }
                None => {
                    return Err(NetworkError::NoPath {
                        origin,
                        destination,
                    })
                }
            }
        }

        Ok(path)
    }

    /// One strictly improving step, or the destination if directly adjacent.
    fn strict_step(&self, here: NodeId, destination: NodeId) -> Option<NodeId> {
        let mut best = self.node_time(here, destination) + 1;
        let mut next = None;
        for arc in &self.adjacency[here.index()] {
            if arc.target == destination {
                return Some(arc.target);
            }
            let through = arc.time + self.node_time(arc.target, destination);
            if arc.time > 0 && through < best {
                best = through;
                next = Some(arc.target);
            }
        }
        next
    }

    /// Breadth-first search across zero-time arcs that stay on a shortest
    /// path, until an arc with positive time (or the destination) appears.
    /// The zero-time chain is appended to `path`; the returned node is the
    /// first one reached with real progress.
    fn zero_fringe_step(
        &self,
        here: NodeId,
        destination: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Option<NodeId> {
        let comparison = self.node_time(here, destination);

        let mut fringe: VecDeque<NodeId> = VecDeque::new();
        let mut heritage: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for arc in &self.adjacency[here.index()] {
            if arc.time + self.node_time(arc.target, destination) <= comparison {
                fringe.push_back(arc.target);
                heritage.entry(arc.target).or_insert_with(|| vec![arc.target]);
            }
        }

        while let Some(node) = fringe.pop_front() {
            for arc in &self.adjacency[node.index()] {
                if arc.time + self.node_time(arc.target, destination) > comparison {
                    continue;
                }
                if arc.time > 0 || arc.target == destination {
                    // Real progress: commit the zero-time chain that led here.
                    path.extend(heritage[&node].iter().copied());
                    return Some(arc.target);
                }
                if !heritage.contains_key(&arc.target) {
                    let mut chain = heritage[&node].clone();
                    chain.push(arc.target);
                    heritage.insert(arc.target, chain);
                    fringe.push_back(arc.target);
                }
            }
        }

        None
    }
}
