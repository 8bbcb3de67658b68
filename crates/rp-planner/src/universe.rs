//! Stop universes and their precedence wiring.
//!
//! A [`Universe`] is an arena of stops plus, per stop, the list of stops it
//! unlocks when visited.  The `available` list holds the stops visitable
//! from the start.  All indices are positions in `stops`.

use std::collections::BTreeSet;

use fnv::{FnvHashMap, FnvHashSet};
use rp_core::{CtspMode, RequestId, LP_LIMITVALUE};
use rp_model::{NodeStop, Vehicle};

use crate::plan::PlanCtx;

pub(crate) struct Universe {
    pub stops: Vec<NodeStop>,
    pub unlocks: Vec<Vec<usize>>,
    pub available: Vec<usize>,
}

/// Build the universe for a fresh plan: one pickup/dropoff pair per new
/// request, plus one dropoff per onboard passenger taken from the vehicle's
/// remaining plan.
///
/// Returns `None` when `FIX_PREFIX` rejects the combination (too many truly
/// new requests to absorb behind the frozen prefix).
pub(crate) fn build_standard(
    ctx: &PlanCtx<'_>,
    vehicle: &Vehicle,
    requests: &[RequestId],
) -> Option<Universe> {
    let mut stops = Vec::with_capacity(2 * requests.len() + vehicle.passengers.len());
    let mut unlocks: Vec<Vec<usize>> = Vec::with_capacity(stops.capacity());
    let mut available = Vec::new();

    for &rid in requests {
        let r = &ctx.requests[rid];
        let pickup = stops.len();
        stops.push(NodeStop::pickup(rid, r.origin));
        stops.push(NodeStop::dropoff(rid, r.destination));
        unlocks.push(vec![pickup + 1]); // pickup unlocks its dropoff
        unlocks.push(Vec::new());
        available.push(pickup);
    }

    // Onboard passengers keep only their dropoff, in remaining-plan order.
    let onboard: FnvHashSet<RequestId> = vehicle.passengers.iter().copied().collect();
    let mut placed: FnvHashSet<RequestId> = FnvHashSet::default();
    let mut onboard_idx = Vec::with_capacity(vehicle.passengers.len());
    for stop in &vehicle.plan {
        if onboard.contains(&stop.request) && placed.insert(stop.request) {
            onboard_idx.push(stops.len());
            stops.push(*stop);
            unlocks.push(Vec::new());
        }
    }

    if ctx.settings.ctsp == CtspMode::FixOnboard
        && requests.len() + vehicle.passengers.len() > 4
        && !onboard_idx.is_empty()
    {
        // Chain the onboard dropoffs in plan order; the search may interleave
        // new stops but can no longer reorder the dropoffs themselves.
        for pair in onboard_idx.windows(2) {
            unlocks[pair[0]] = vec![pair[1]];
        }
        available.push(onboard_idx[0]);
    } else {
        available.extend(onboard_idx.iter().copied());
    }

    if ctx.settings.ctsp == CtspMode::FixPrefix && stops.len() > LP_LIMITVALUE {
        if !freeze_prefix(ctx, vehicle, requests, &stops, &mut unlocks, &mut available) {
            return None;
        }
    }

    Some(Universe {
        stops,
        unlocks,
        available,
    })
}

/// Rewire the universe so that the first `stops.len() - LP_LIMITVALUE` stops
/// of last epoch's plan form a strict chain; the final chained stop unlocks
/// everything that would otherwise have been available.  Returns `false` to
/// reject the combination outright.
fn freeze_prefix(
    ctx: &PlanCtx<'_>,
    vehicle: &Vehicle,
    requests: &[RequestId],
    stops: &[NodeStop],
    unlocks: &mut [Vec<usize>],
    available: &mut Vec<usize>,
) -> bool {
    let pending: FnvHashSet<RequestId> = vehicle.pending.iter().copied().collect();
    let new_count = requests.iter().filter(|r| !pending.contains(r)).count();
    if 2 * new_count > LP_LIMITVALUE {
        // The prefix cannot absorb this many new stops.
        return false;
    }

    let index_of: FnvHashMap<NodeStop, usize> =
        stops.iter().enumerate().map(|(i, s)| (*s, i)).collect();
    let previous_order: Vec<usize> = vehicle
        .plan
        .iter()
        .filter_map(|stop| index_of.get(stop).copied())
        .collect();

    let frozen = stops.len() - LP_LIMITVALUE;
    assert!(
        previous_order.len() >= frozen,
        "vehicle {}: previous plan covers {} of {} frozen stops",
        vehicle.id,
        previous_order.len(),
        frozen
    );

    // Walk the frozen prefix, tracking what it would have made available.
    let mut captured: BTreeSet<usize> = available.iter().copied().collect();
    *available = vec![previous_order[0]];
    for i in 0..frozen {
        let stop = previous_order[i];
        captured.remove(&stop);
        for &unlocked in &unlocks[stop] {
            captured.insert(unlocked);
        }
        unlocks[stop] = if i + 1 < frozen {
            vec![previous_order[i + 1]]
        } else {
            captured.iter().copied().collect()
        };
    }
    true
}

/// Build the replay universe for memory mode: the recorded plan as a strict
/// chain with a single admissible permutation.
pub(crate) fn build_memory(vehicle: &Vehicle) -> Universe {
    let stops: Vec<NodeStop> = vehicle.plan.clone();
    let mut unlocks: Vec<Vec<usize>> = vec![Vec::new(); stops.len()];
    for i in 1..stops.len() {
        unlocks[i - 1] = vec![i];
    }
    let available = if stops.is_empty() { Vec::new() } else { vec![0] };
    Universe {
        stops,
        unlocks,
        available,
    }
}
