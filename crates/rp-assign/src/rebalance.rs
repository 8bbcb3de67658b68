//! Rebalancing of leftover idle vehicles toward unserved demand.
//!
//! A binary matching LP pairs idle, unassigned vehicles with the origins of
//! requests the assignment missed: exactly `min(R, V)` matches, each vehicle
//! and each request used at most once, total approach time minimized.
//! Vehicles already mid-relocation that received nothing new simply continue
//! toward their stored target.

use std::collections::BTreeMap;

use fnv::FnvHashSet;
use good_lp::solvers::highs::highs;
use good_lp::{variable, variables, Expression, Solution, SolverModel, Variable};
use rp_core::{RequestId, VehicleId, REBALANCE_RELGAP, REBALANCE_TIMELIMIT};
use rp_model::{Trip, TripKind};
use tracing::debug;

use crate::error::{AssignError, AssignResult};
use crate::pipeline::AssignCtx;

/// Build relocation trips for every idle vehicle the assignment skipped.
///
/// The result is disjoint from `assigned` by construction; the epoch driver
/// merges the two maps before the simulator advance.
pub fn make_rebalance(
    ctx: &AssignCtx<'_>,
    assigned: &BTreeMap<VehicleId, Trip>,
    active_vehicles: &[VehicleId],
    active_requests: &[RequestId],
) -> AssignResult<BTreeMap<VehicleId, Trip>> {
    // Idle = no riders, no assignment, not already relocating.
    let idle: Vec<VehicleId> = active_vehicles
        .iter()
        .copied()
        .filter(|vid| {
            let v = &ctx.vehicles[*vid];
            v.passengers.is_empty() && !assigned.contains_key(vid) && v.rebalance_target.is_none()
        })
        .collect();

    let served: FnvHashSet<RequestId> = assigned
        .values()
        .flat_map(|t| t.requests.iter().copied())
        .collect();
    let unserved: Vec<RequestId> = active_requests
        .iter()
        .copied()
        .filter(|r| !served.contains(r))
        .collect();

    let mut relocations = BTreeMap::new();
    if !idle.is_empty() && !unserved.is_empty() {
        relocations = match_idle_to_unserved(ctx, &idle, &unserved)?;
    }

    // Mid-relocation vehicles with nothing new keep going.
    for &vid in active_vehicles {
        let v = &ctx.vehicles[vid];
        if let Some(target) = v.rebalance_target {
            if v.passengers.is_empty() && !assigned.contains_key(&vid) {
                relocations.insert(
                    vid,
                    Trip {
                        requests: Vec::new(),
                        stops: Vec::new(),
                        cost: 0,
                        kind: TripKind::Rebalance { target },
                    },
                );
            }
        }
    }

    Ok(relocations)
}

fn match_idle_to_unserved(
    ctx: &AssignCtx<'_>,
    idle: &[VehicleId],
    unserved: &[RequestId],
) -> AssignResult<BTreeMap<VehicleId, Trip>> {
    let n_vehicles = idle.len();
    let n_requests = unserved.len();
    let match_count = n_vehicles.min(n_requests);
    debug!(
        vehicles = n_vehicles,
        requests = n_requests,
        "rebalance matching"
    );

    // Approach time of vehicle row v to request column r.
    let approach = |v: usize, r: usize| -> rp_core::Seconds {
        let origin = ctx.requests[unserved[r]].origin;
        ctx.vehicles[idle[v]].time_to(ctx.network, origin)
    };

    let mut vars = variables!();
    let xs: Vec<Vec<Variable>> = (0..n_vehicles)
        .map(|_| {
            (0..n_requests)
                .map(|_| vars.add(variable().binary()))
                .collect()
        })
        .collect();

    let mut objective = Expression::from(0.0);
    for (v, row) in xs.iter().enumerate() {
        for (r, &x) in row.iter().enumerate() {
            objective = objective + approach(v, r) as f64 * x;
        }
    }

    let mut model = vars
        .minimise(objective)
        .using(highs)
        .set_verbose(false)
        .set_time_limit(REBALANCE_TIMELIMIT)
        .set_mip_rel_gap(REBALANCE_RELGAP)
        .set_mip_abs_gap(0.0);

    // Exactly min(R, V) matches overall…
    let total = xs
        .iter()
        .flatten()
        .fold(Expression::from(0.0), |acc, &x| acc + x);
    model.add_constraint(total.eq(match_count as f64));

    // …with every vehicle and every request matched at most once.
    for row in &xs {
        let sum = row.iter().fold(Expression::from(0.0), |acc, &x| acc + x);
        model.add_constraint(sum.leq(1.0));
    }
    for r in 0..n_requests {
        let sum = xs
            .iter()
            .fold(Expression::from(0.0), |acc, row| acc + row[r]);
        model.add_constraint(sum.leq(1.0));
    }

    let solution = model
        .solve()
        .map_err(|e| AssignError::Solver(format!("rebalance matching: {e}")))?;

    let mut relocations = BTreeMap::new();
    for (v, row) in xs.iter().enumerate() {
        for (r, &x) in row.iter().enumerate() {
            if solution.value(x) > 0.5 {
                let rid = unserved[r];
                relocations.insert(
                    idle[v],
                    Trip {
                        requests: vec![rid],
                        stops: Vec::new(),
                        cost: approach(v, r),
                        kind: TripKind::Rebalance {
                            target: ctx.requests[rid].origin,
                        },
                    },
                );
                break;
            }
        }
    }
    Ok(relocations)
}
