//! Request–Trip–Vehicle enumeration.
//!
//! Per vehicle, feasible request cliques are grown rank by rank: rank-k
//! candidates are unions of two rank-(k−1) trips differing by one request,
//! filtered by RR connectivity, by the presence of every (k−1)-subset
//! (Apriori), and by a newness budget before the oracle is consulted.  A
//! per-vehicle wall-clock budget truncates later ranks but keeps everything
//! found so far.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;
use rayon::prelude::*;
use rp_core::{RequestId, Seconds, VehicleId};
use rp_model::{Trip, TripKind};
use rp_planner::{plan_route, PlanMode};

use crate::error::{AssignError, AssignResult};
use crate::pipeline::AssignCtx;

/// Budget for requests a clique may contain beyond the vehicle's pending
/// set; each truly new request costs two points.
const NEWNESS_BUDGET: i32 = 8;
const NEWNESS_COST: i32 = 2;

/// Enumerate the trip list of every vehicle.
///
/// `sorted_vehicles` should put the heaviest RV neighborhoods first; each
/// vehicle is an independent task so the pool balances the wildly varying
/// per-vehicle work.
pub fn build_rtv(
    ctx: &AssignCtx<'_>,
    sorted_vehicles: &[VehicleId],
    vr_edges: &FnvHashMap<VehicleId, Vec<RequestId>>,
    rr_edges: &FnvHashMap<RequestId, FnvHashSet<RequestId>>,
    now: Seconds,
) -> AssignResult<BTreeMap<VehicleId, Vec<Trip>>> {
    let per_vehicle: Vec<(VehicleId, Vec<Trip>)> = sorted_vehicles
        .par_iter()
        .with_max_len(1)
        .map(|&vid| {
            let neighbors = vr_edges.get(&vid).map_or(&[][..], Vec::as_slice);
            vehicle_trips(ctx, vid, neighbors, rr_edges, now).map(|trips| (vid, trips))
        })
        .collect::<AssignResult<_>>()?;
    Ok(per_vehicle.into_iter().collect())
}

fn vehicle_trips(
    ctx: &AssignCtx<'_>,
    vid: VehicleId,
    neighbors: &[RequestId],
    rr_edges: &FnvHashMap<RequestId, FnvHashSet<RequestId>>,
    now: Seconds,
) -> AssignResult<Vec<Trip>> {
    let vehicle = &ctx.vehicles[vid];
    let plan_ctx = ctx.plan_ctx();
    let deadline = (ctx.settings.rtv_timelimit > 0)
        .then(|| Instant::now() + Duration::from_millis(ctx.settings.rtv_timelimit));

    // Rank 0: the baseline trip serving nobody new.  It must exist; the
    // onboard dropoffs were feasible when they were boarded.
    let baseline = plan_route(&plan_ctx, vehicle, &[], PlanMode::Standard, now, deadline)
        .ok_or(AssignError::BaselineInfeasible {
            vehicle: vehicle.id,
        })?;
    let mut rounds: Vec<Vec<Trip>> = vec![vec![Trip::baseline(baseline.stops, baseline.cost)]];

    // Rank 1: RV neighbors plus whatever is already promised.
    let pool: BTreeSet<RequestId> = neighbors
        .iter()
        .chain(vehicle.pending.iter())
        .copied()
        .collect();
    let singles = pool
        .into_iter()
        .filter_map(|rid| {
            plan_route(&plan_ctx, vehicle, &[rid], PlanMode::Standard, now, deadline).map(
                |plan| Trip {
                    requests: vec![rid],
                    stops: plan.stops,
                    cost: plan.cost,
                    kind: TripKind::Standard,
                },
            )
        })
        .collect();
    rounds.push(singles);

    let pending: FnvHashSet<RequestId> = vehicle.pending.iter().copied().collect();
    let mut timed_out = false;
    while !rounds.last().expect("rank 0 exists").is_empty() && !timed_out {
        let k = rounds.len();
        if k > vehicle.capacity {
            break;
        }
        let next = {
            let prev = &rounds[k - 1];
            let prev_sets: FnvHashSet<&[RequestId]> =
                prev.iter().map(|t| t.requests.as_slice()).collect();
            let mut considered: FnvHashSet<Vec<RequestId>> = FnvHashSet::default();
            let mut next: Vec<Trip> = Vec::new();

            'pairs: for (first, left) in prev.iter().enumerate() {
                for right in &prev[first + 1..] {
                    if let Some(d) = deadline {
                        if Instant::now() >= d {
                            timed_out = true;
                            break 'pairs;
                        }
                    }

                    let union: Vec<RequestId> = left
                        .requests
                        .iter()
                        .merge(right.requests.iter())
                        .dedup()
                        .copied()
                        .collect();

                    // Newness budget over the whole clique.
                    let budget = NEWNESS_BUDGET
                        - NEWNESS_COST
                            * union.iter().filter(|r| !pending.contains(r)).count() as i32;
                    if budget < 0 {
                        continue;
                    }

                    // Only unions that add exactly one request, once each.
                    if union.len() != k {
                        continue;
                    }
                    if !considered.insert(union.clone()) {
                        continue;
                    }

                    if !rr_connected(rr_edges, &left.requests, &right.requests)
                        || !rr_connected(rr_edges, &right.requests, &left.requests)
                    {
                        continue;
                    }

                    // Apriori: every (k-1)-subset must itself be a trip.
                    let closed = (0..union.len()).all(|skip| {
                        let subset: Vec<RequestId> = union
                            .iter()
                            .enumerate()
                            .filter(|&(i, _)| i != skip)
                            .map(|(_, &r)| r)
                            .collect();
                        prev_sets.contains(subset.as_slice())
                    });
                    if !closed {
                        continue;
                    }

                    if let Some(plan) =
                        plan_route(&plan_ctx, vehicle, &union, PlanMode::Standard, now, deadline)
                    {
                        next.push(Trip {
                            requests: union,
                            stops: plan.stops,
                            cost: plan.cost,
                            kind: TripKind::Standard,
                        });
                    }
                }
            }
            next
        };
        rounds.push(next);
    }

    let mut trips: Vec<Trip> = rounds.into_iter().flatten().collect();

    // Continuity: a vehicle with a live plan always offers the solver the
    // option of keeping it.
    if !vehicle.plan.is_empty() {
        let mut kept = vehicle.pending.clone();
        kept.sort_unstable();
        let plan = plan_route(&plan_ctx, vehicle, &kept, PlanMode::Memory, now, None)
            .ok_or_else(|| AssignError::ContinuityLost {
                vehicle: vehicle.id,
                pending: kept.iter().map(|&r| ctx.requests[r].id).collect(),
            })?;
        trips.push(Trip {
            requests: kept,
            stops: plan.stops,
            cost: plan.cost,
            kind: TripKind::Memory,
        });
    }

    Ok(trips)
}

/// Every request only in `xs` must be RR-adjacent (in either direction) to
/// every request of `ys`.
fn rr_connected(
    rr_edges: &FnvHashMap<RequestId, FnvHashSet<RequestId>>,
    xs: &[RequestId],
    ys: &[RequestId],
) -> bool {
    let edge = |a: RequestId, b: RequestId| {
        rr_edges.get(&a).is_some_and(|set| set.contains(&b))
    };
    xs.iter()
        .filter(|r| !ys.contains(r))
        .all(|&r| ys.iter().all(|&q| edge(r, q) || edge(q, r)))
}
