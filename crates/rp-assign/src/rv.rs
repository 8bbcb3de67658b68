//! Request–Vehicle feasibility edges.

use std::collections::BTreeSet;

use fnv::FnvHashMap;
use rayon::prelude::*;
use rp_core::{RequestId, Seconds, VehicleId, PRUNING_RV_K};
use rp_planner::{plan_route, PlanMode};

use crate::pipeline::AssignCtx;

/// For every active request, the vehicles that could serve it alone within
/// its windows, nearest first.
///
/// A cheap wait-time bound (ignoring the vehicle's other riders) filters the
/// fleet before the oracle is consulted; surviving vehicles are probed in
/// ascending wait order so an optional `PRUNING_RV_K` cap keeps the closest
/// feasible ones.
pub fn build_rv(
    ctx: &AssignCtx<'_>,
    active_requests: &[RequestId],
    active_vehicles: &[VehicleId],
    now: Seconds,
) -> FnvHashMap<RequestId, Vec<VehicleId>> {
    active_requests
        .par_iter()
        .map(|&rid| (rid, vehicles_for_request(ctx, rid, active_vehicles, now)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

fn vehicles_for_request(
    ctx: &AssignCtx<'_>,
    rid: RequestId,
    active_vehicles: &[VehicleId],
    now: Seconds,
) -> Vec<VehicleId> {
    let request = &ctx.requests[rid];

    // Wait-ordered candidates; the id tiebreak keeps the order stable.
    let mut nearest: BTreeSet<(Seconds, VehicleId)> = BTreeSet::new();
    for &vid in active_vehicles {
        let min_wait = ctx.vehicles[vid].time_to(ctx.network, request.origin);
        if now + min_wait > request.latest_boarding {
            continue;
        }
        nearest.insert((min_wait, vid));
    }

    let plan_ctx = ctx.plan_ctx();
    let mut compatible = Vec::new();
    for (_, vid) in nearest {
        let feasible = plan_route(
            &plan_ctx,
            &ctx.vehicles[vid],
            &[rid],
            PlanMode::Standard,
            now,
            None,
        )
        .is_some();
        if feasible {
            compatible.push(vid);
            if PRUNING_RV_K > 0 && compatible.len() >= PRUNING_RV_K {
                break;
            }
        }
    }
    compatible
}

/// Invert request→vehicles into vehicle→requests for the RTV stage.
pub fn invert(
    rv_edges: &FnvHashMap<RequestId, Vec<VehicleId>>,
) -> FnvHashMap<VehicleId, Vec<RequestId>> {
    let mut vr: FnvHashMap<VehicleId, Vec<RequestId>> = FnvHashMap::default();
    for (&rid, vehicles) in rv_edges {
        for &vid in vehicles {
            vr.entry(vid).or_default().push(rid);
        }
    }
    vr
}
