//! Depth-first branch-and-bound over stop orderings.
//!
//! State per recursion level is the current node, the residual cabin
//! capacity, the set of unlocked-but-unvisited stops and the clock.  The
//! candidate order is canonical — by node, dropoffs before pickups, then by
//! stop identity — which makes the same-node dropoff dedup below
//! well-defined.  Bound: with the VMT objective any partial arrival at or
//! past the best known finish time can be cut.

use std::collections::BTreeSet;
use std::time::Instant;

use rp_core::{NodeId, Seconds};

use crate::plan::PlanCtx;
use crate::universe::Universe;

/// Sorted-set key: canonical candidate order.  `false < true` puts dropoffs
/// ahead of pickups at the same node; the stop index breaks ties.
type StopKey = (NodeId, bool, usize);

#[derive(Copy, Clone, PartialEq, Eq)]
enum Action {
    None,
    Pickup,
    Dropoff,
}

pub(crate) struct Search<'a, 'b> {
    pub ctx: &'a PlanCtx<'b>,
    pub universe: &'a Universe,
    pub deadline: Option<Instant>,
}

impl Search<'_, '_> {
    fn key(&self, idx: usize) -> StopKey {
        let stop = &self.universe.stops[idx];
        (stop.node, stop.is_pickup, idx)
    }

    /// Run the search from the vehicle position.  Returns the arrival time
    /// at the final stop and the stop indices in *reverse* visit order, or
    /// `None` if no ordering satisfies every constraint.
    pub fn run(
        &self,
        start: NodeId,
        residual_capacity: i32,
        start_time: Seconds,
    ) -> Option<(Seconds, Vec<usize>)> {
        let available: BTreeSet<StopKey> = self
            .universe
            .available
            .iter()
            .map(|&i| self.key(i))
            .collect();
        self.recurse(
            start,
            residual_capacity,
            &available,
            start_time,
            None,
            Action::None,
        )
    }

    fn recurse(
        &self,
        here: NodeId,
        residual_capacity: i32,
        available: &BTreeSet<StopKey>,
        now: Seconds,
        mut best: Option<Seconds>,
        prev_action: Action,
    ) -> Option<(Seconds, Vec<usize>)> {
        if available.is_empty() {
            return Some((now, Vec::new()));
        }

        let settings = self.ctx.settings;
        let mut best_tail: Option<Vec<usize>> = None;
        let mut last_tried: Option<NodeId> = None;

        for &(node, is_pickup, idx) in available {
            // Budget poll between candidates; keep whatever was found so far.
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }

            // Consecutive dropoffs at one node are interchangeable: keep the
            // canonical first and skip the symmetric orderings.
            if !is_pickup && last_tried == Some(node) {
                continue;
            }
            last_tried = Some(node);

            let stop = &self.universe.stops[idx];
            let request = &self.ctx.requests[stop.request];

            // Arrival: drive, hold for an early pickup, charge the dwell of
            // the batch being left, re-hold (the dwell may pass entry time).
            let mut arrival = now + self.ctx.network.node_time(here, node);
            if is_pickup && request.entry_time > arrival {
                arrival = request.entry_time;
            }
            if prev_action == Action::Dropoff && (is_pickup || here != node) {
                arrival += settings.dwell_alight;
            } else if prev_action == Action::Pickup && (!is_pickup || here != node) {
                arrival += settings.dwell_pickup;
            }
            if is_pickup && request.entry_time > arrival {
                arrival = request.entry_time;
            }

            // Bound on the VMT objective.
            if let Some(bound) = best {
                if arrival >= bound {
                    continue;
                }
            }

            let new_residual = if is_pickup {
                residual_capacity - 1
            } else {
                residual_capacity + 1
            };
            if new_residual < 0 {
                continue;
            }

            if is_pickup && arrival > request.latest_boarding {
                continue;
            }
            if !is_pickup && arrival > request.latest_alighting {
                continue;
            }

            // Next level's availability: this stop consumed, successors
            // unlocked.
            let mut rest = available.clone();
            rest.remove(&(node, is_pickup, idx));
            for &unlocked in &self.universe.unlocks[idx] {
                rest.insert(self.key(unlocked));
            }

            // Every stop still ahead must remain reachable in its window.
            let reachable = rest.iter().all(|&(n, pickup, i)| {
                let ahead = &self.ctx.requests[self.universe.stops[i].request];
                let reach = arrival + self.ctx.network.node_time(node, n);
                if pickup {
                    reach <= ahead.latest_boarding
                } else {
                    reach <= ahead.latest_alighting
                }
            });
            if !reachable {
                continue;
            }

            let action = if is_pickup {
                Action::Pickup
            } else {
                Action::Dropoff
            };
            if let Some((finish, mut tail)) =
                self.recurse(node, new_residual, &rest, arrival, best, action)
            {
                if best.map_or(true, |bound| finish < bound) {
                    best = Some(finish);
                    tail.push(idx);
                    best_tail = Some(tail);
                }
            }
        }

        best_tail.map(|tail| (best.expect("tail implies a bound"), tail))
    }
}
