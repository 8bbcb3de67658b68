//! Request–Request shareability edges.

use fnv::{FnvHashMap, FnvHashSet};
use rayon::prelude::*;
use rp_core::{RequestId, Seconds, PRUNING_RR_K};
use rp_model::Vehicle;
use rp_planner::{plan_route, PlanMode};

use crate::pipeline::AssignCtx;

/// For every request `r1`, the requests that could share a cabin with it,
/// probed on a synthetic empty vehicle parked at `r1`'s origin.
///
/// The edge is directed — the probe boards `r1`'s side of the pairing first
/// — and downstream connectivity checks accept either direction.  Candidates
/// are ranked by [`detour_factor`] so the optional `PRUNING_RR_K` cap keeps
/// the least-detour partners.
pub fn build_rr(
    ctx: &AssignCtx<'_>,
    active_requests: &[RequestId],
    now: Seconds,
) -> FnvHashMap<RequestId, FnvHashSet<RequestId>> {
    active_requests
        .par_iter()
        .map(|&r1| (r1, partners_for_request(ctx, r1, active_requests, now)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

fn partners_for_request(
    ctx: &AssignCtx<'_>,
    r1: RequestId,
    active_requests: &[RequestId],
    now: Seconds,
) -> FnvHashSet<RequestId> {
    let first = &ctx.requests[r1];
    let probe = Vehicle::probe(first.origin);
    let plan_ctx = ctx.plan_ctx();

    let mut compatible = Vec::new();
    for &r2 in active_requests {
        if r2 == r1 {
            continue;
        }
        let second = &ctx.requests[r2];

        // Wait bound before paying for the oracle: the probe serves r1's
        // origin first, so r2 can be boarded no earlier than that.
        let min_wait = ctx.network.node_time(first.origin, second.origin);
        if min_wait + now.max(first.entry_time) > second.latest_boarding {
            continue;
        }

        let feasible = plan_route(
            &plan_ctx,
            &probe,
            &[r1, r2],
            PlanMode::Standard,
            now,
            None,
        )
        .is_some();
        if feasible {
            compatible.push(r2);
        }
    }

    compatible.sort_by(|&a, &b| {
        detour_factor(ctx, r1, a)
            .partial_cmp(&detour_factor(ctx, r1, b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    if PRUNING_RR_K > 0 {
        compatible.truncate(PRUNING_RR_K);
    }
    compatible.into_iter().collect()
}

/// How much chaining `a` and `b` stretches the shorter ride: the best of
/// serving `b`'s origin inside `a`'s trip and the symmetric insertion,
/// relative to the solo time.  Lower is a better match.
pub fn detour_factor(ctx: &AssignCtx<'_>, a: RequestId, b: RequestId) -> f64 {
    let ra = &ctx.requests[a];
    let rb = &ctx.requests[b];
    let (o1, d1) = (ra.origin, ra.destination);
    let (o2, d2) = (rb.origin, rb.destination);

    let mut best = f64::INFINITY;
    let solo_a = ctx.network.node_time(o1, d1);
    if solo_a != 0 {
        let chained = ctx.network.node_time(o1, o2) + ctx.network.node_time(o2, d1);
        best = best.min(chained as f64 / solo_a as f64);
    }
    let solo_b = ctx.network.node_time(o2, d2);
    if solo_b != 0 {
        let chained = ctx.network.node_time(o2, o1) + ctx.network.node_time(o1, d2);
        best = best.min(chained as f64 / solo_b as f64);
    }
    if solo_a == 0 && solo_b == 0 {
        best = 0.0;
    }
    best
}
