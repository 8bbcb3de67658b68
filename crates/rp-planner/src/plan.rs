//! Oracle entry points.

use std::time::Instant;

use rp_core::{CtspObjective, RequestId, Seconds, Settings};
use rp_model::{NodeStop, RequestStore, Vehicle};
use rp_network::Network;

use crate::search::Search;
use crate::universe::{build_memory, build_standard};

/// Read-only context threaded through every oracle call.
#[derive(Copy, Clone)]
pub struct PlanCtx<'a> {
    pub network: &'a Network,
    pub requests: &'a RequestStore,
    pub settings: &'a Settings,
}

/// What the caller wants from the oracle.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PlanMode {
    /// Plan afresh from the vehicle's onboard dropoffs plus the new requests.
    Standard,
    /// Replay the vehicle's recorded plan, re-costed against the clock.
    Memory,
    /// Relocation toward a single request's origin; no window checks.
    Rebalance,
}

/// A feasible plan: cost (vehicle seconds from the epoch time under the VMT
/// objective) and the ordered stop sequence realizing it.
#[derive(Clone, Debug)]
pub struct RoutePlan {
    pub cost: Seconds,
    pub stops: Vec<NodeStop>,
}

/// Decide feasibility of serving `requests` with `vehicle` and return the
/// minimum-cost ordered plan.
///
/// `now` is the epoch time; the vehicle's residual segment offset is added
/// internally.  `deadline`, when set, bounds the search wall-clock: on
/// expiry the best ordering found so far is kept and unexplored branches are
/// abandoned, so the result may be suboptimal but never infeasible-as-lie.
///
/// Returns `None` when no admissible ordering exists — a normal outcome the
/// assignment pipeline consumes as data.
pub fn plan_route(
    ctx: &PlanCtx<'_>,
    vehicle: &Vehicle,
    requests: &[RequestId],
    mode: PlanMode,
    now: Seconds,
    deadline: Option<Instant>,
) -> Option<RoutePlan> {
    match mode {
        PlanMode::Standard => {
            let universe = build_standard(ctx, vehicle, requests)?;
            run_search(ctx, vehicle, universe, now, deadline)
        }
        PlanMode::Memory => run_search(ctx, vehicle, build_memory(vehicle), now, deadline),
        PlanMode::Rebalance => Some(rebalance(ctx, vehicle, requests)),
    }
}

fn run_search(
    ctx: &PlanCtx<'_>,
    vehicle: &Vehicle,
    universe: crate::universe::Universe,
    now: Seconds,
    deadline: Option<Instant>,
) -> Option<RoutePlan> {
    assert!(
        ctx.settings.ctsp_objective == CtspObjective::Vmt,
        "unimplemented CTSP objective {:?} reached the planner",
        ctx.settings.ctsp_objective
    );

    let search = Search {
        ctx,
        universe: &universe,
        deadline,
    };
    let residual = vehicle.capacity as i32 - vehicle.passengers.len() as i32;
    let (finish, reverse_order) = search.run(vehicle.node, residual, now + vehicle.offset)?;

    let stops = reverse_order
        .into_iter()
        .rev()
        .map(|idx| universe.stops[idx])
        .collect();
    Some(RoutePlan {
        cost: finish - now,
        stops,
    })
}

/// Relocation plan: drive to the request's origin, nominally continue to its
/// destination.  Cost is the full chain; windows and capacity do not apply.
fn rebalance(ctx: &PlanCtx<'_>, vehicle: &Vehicle, requests: &[RequestId]) -> RoutePlan {
    debug_assert!(
        vehicle.passengers.is_empty(),
        "vehicle {} rebalancing with riders onboard",
        vehicle.id
    );
    let rid = requests[0];
    let r = &ctx.requests[rid];
    let cost =
        vehicle.time_to(ctx.network, r.origin) + ctx.network.node_time(r.origin, r.destination);
    RoutePlan {
        cost,
        stops: vec![
            NodeStop::pickup(rid, r.origin),
            NodeStop::dropoff(rid, r.destination),
        ],
    }
}
