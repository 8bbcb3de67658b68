//! Per-epoch orchestration of the assignment chain.

use std::collections::BTreeMap;

use fnv::{FnvHashMap, FnvHashSet};
use rp_core::{encode_hms, RequestId, Seconds, Settings, VehicleId};
use rp_model::{RequestStore, Trip, VehicleStore};
use rp_network::Network;
use rp_output::RunLogs;
use rp_planner::PlanCtx;
use tracing::info;

use crate::error::{AssignError, AssignResult};
use crate::ilp::{self, SolverReport};
use crate::rr;
use crate::rtv;
use crate::rv;

/// Read-only world state shared by every stage of the pipeline.
#[derive(Copy, Clone)]
pub struct AssignCtx<'a> {
    pub network: &'a Network,
    pub requests: &'a RequestStore,
    pub vehicles: &'a VehicleStore,
    pub settings: &'a Settings,
}

impl<'a> AssignCtx<'a> {
    /// The oracle's view of the same world.
    pub fn plan_ctx(&self) -> PlanCtx<'a> {
        PlanCtx {
            network: self.network,
            requests: self.requests,
            settings: self.settings,
        }
    }
}

/// Run RV → RR → RTV → ILP for one epoch and return the chosen trip per
/// vehicle plus the solver report (absent when there was nothing to solve).
///
/// All parallel fan-outs run on `pool`; the merged structures are iterated
/// in vehicle-id order so results are reproducible for a fixed thread count.
pub fn assignment(
    ctx: &AssignCtx<'_>,
    active_vehicles: &[VehicleId],
    active_requests: &[RequestId],
    now: Seconds,
    pool: &rayon::ThreadPool,
    logs: &RunLogs,
) -> AssignResult<(BTreeMap<VehicleId, Trip>, Option<SolverReport>)> {
    info!(
        vehicles = active_vehicles.len(),
        requests = active_requests.len(),
        "building RV edges"
    );
    let rv_edges = pool.install(|| rv::build_rv(ctx, active_requests, active_vehicles, now));
    let vr_edges = rv::invert(&rv_edges);

    info!("building RR edges");
    let rr_edges = pool.install(|| rr::build_rr(ctx, active_requests, now));

    // Vehicles with the largest RV neighborhoods start first: the
    // one-task-per-vehicle fan-out balances best when the heavy work is not
    // queued last.  Pure load balancing; results are order-independent.
    let mut sorted = active_vehicles.to_vec();
    sorted.sort_by(|a, b| {
        let edges_a = vr_edges.get(a).map_or(0, Vec::len);
        let edges_b = vr_edges.get(b).map_or(0, Vec::len);
        edges_b.cmp(&edges_a).then(a.cmp(b))
    });

    info!("building RTV trips");
    let trip_list =
        pool.install(|| rtv::build_rtv(ctx, &sorted, &vr_edges, &rr_edges, now))?;

    let trip_count: usize = trip_list.values().map(Vec::len).sum();
    info!(trips = trip_count, "trip list built");

    check_promises_kept(ctx, &trip_list, active_requests)?;

    if logs.rtv_enabled() {
        logs.rtv_block(&trip_trace(ctx, &trip_list, now));
    }

    ilp::solve_assignment(ctx, &trip_list, active_requests, now, logs)
}

/// Abort if any previously promised request fell out of the trip lists, or
/// any vehicle lost the option of keeping its previous assignment.  Either
/// one means an oracle or continuity bug upstream, not an operational
/// condition.
fn check_promises_kept(
    ctx: &AssignCtx<'_>,
    trip_list: &BTreeMap<VehicleId, Vec<Trip>>,
    active_requests: &[RequestId],
) -> AssignResult<()> {
    let in_any_trip: FnvHashSet<RequestId> = trip_list
        .values()
        .flatten()
        .flat_map(|t| t.requests.iter().copied())
        .collect();

    let mut pending_on: FnvHashMap<RequestId, VehicleId> = FnvHashMap::default();
    for (vid, vehicle) in ctx.vehicles.iter() {
        for &rid in &vehicle.pending {
            pending_on.insert(rid, vid);
        }
    }

    for &rid in active_requests {
        if !ctx.requests[rid].assigned || in_any_trip.contains(&rid) {
            continue;
        }
        let request = ctx.requests[rid].id;
        return Err(match pending_on.get(&rid) {
            None => AssignError::AssignedRequestDropped { request },
            Some(&vid) => AssignError::PendingRequestDropped {
                request,
                vehicle: ctx.vehicles[vid].id,
            },
        });
    }

    for (&vid, trips) in trip_list {
        let vehicle = &ctx.vehicles[vid];
        let mut pending = vehicle.pending.clone();
        pending.sort_unstable();
        if !trips.iter().any(|t| t.requests == pending) {
            return Err(AssignError::ContinuityMissing {
                vehicle: vehicle.id,
                pending: pending.iter().map(|&r| ctx.requests[r].id).collect(),
            });
        }
    }

    Ok(())
}

/// One `{'v':…,'rs':[…],'c':…}` line per generated trip.
fn trip_trace(
    ctx: &AssignCtx<'_>,
    trip_list: &BTreeMap<VehicleId, Vec<Trip>>,
    now: Seconds,
) -> String {
    let mut out = format!("TIME STAMP {}\n", encode_hms(now));
    for (&vid, trips) in trip_list {
        let vehicle_id = ctx.vehicles[vid].id;
        for trip in trips {
            out.push_str(&format!("{{'v':{vehicle_id},'rs':["));
            for &rid in &trip.requests {
                out.push_str(&format!("{},", ctx.requests[rid].id));
            }
            out.push_str(&format!("],'c':{}}}\n", trip.cost));
        }
    }
    out
}
