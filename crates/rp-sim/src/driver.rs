//! The epoch loop.
//!
//! Per epoch: ingest requests arriving in `[t, t+Δ)`, run the assignment
//! pipeline, prune trivial assignments, rebalance the leftover idle
//! vehicles, advance every vehicle one interval, fold the rider events into
//! the statistics, and refresh the active-request carry-over.
//!
//! Carry-over policy: the active list keeps exactly the service-assigned
//! riders who have not boarded and whose boarding window is still open.
//! Requests the solver missed leave the pool; requests consumed as
//! relocation targets are marked `assigned` (they count toward the service
//! statistics) and leave the pool as well.

use std::collections::BTreeMap;
use std::time::Instant;

use fnv::FnvHashSet;
use rp_assign::{assignment, rebalance, AssignCtx};
use rp_core::{decode_hms, encode_hms, RequestId, Seconds, Settings, VehicleId};
use rp_model::{RequestStore, Trip, TripKind, VehicleStore};
use rp_network::Network;
use rp_output::RunLogs;
use tracing::info;

use crate::error::SimResult;
use crate::kinematics::{advance_one, SimCtx, StepOutcome};
use crate::stats::{self, EpochTimings, RollingStats};

/// Run the whole simulation described by `settings`.
pub fn run(
    settings: &Settings,
    network: &Network,
    requests: &mut RequestStore,
    vehicles: &mut VehicleStore,
    pool: &rayon::ThreadPool,
    logs: &RunLogs,
) -> SimResult<()> {
    logs.results_block(&stats::run_header(settings));

    let start = decode_hms(settings.initial_time);
    let end = decode_hms(settings.final_time);
    let all_vehicles: Vec<VehicleId> = vehicles.ids().collect();

    let mut stats = RollingStats::new();
    let mut active: Vec<RequestId> = Vec::new();
    let mut last_epoch = start;

    let mut now = start;
    while now < end {
        last_epoch = now;
        run_epoch(
            settings,
            network,
            requests,
            vehicles,
            pool,
            logs,
            &all_vehicles,
            &mut active,
            &mut stats,
            now,
            start,
        )?;
        now += settings.interval;
    }

    // End-of-run summary: credit still-pending riders, account onboard time.
    let still_pending: Vec<(Seconds, bool)> = active
        .iter()
        .map(|&rid| {
            let r = &requests[rid];
            (r.entry_time, r.boarding_time.is_some())
        })
        .collect();
    let onboard_rides: Vec<Seconds> = vehicles
        .iter()
        .flat_map(|(_, v)| v.passengers.iter())
        .filter_map(|&rid| {
            let r = &requests[rid];
            match (r.boarding_time, r.alighting_time) {
                (Some(boarded), None) => Some(last_epoch - boarded),
                _ => None,
            }
        })
        .collect();
    logs.results_block(&stats.final_block(
        last_epoch,
        start,
        settings,
        vehicles,
        &still_pending,
        &onboard_rides,
    ));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_epoch(
    settings: &Settings,
    network: &Network,
    requests: &mut RequestStore,
    vehicles: &mut VehicleStore,
    pool: &rayon::ThreadPool,
    logs: &RunLogs,
    all_vehicles: &[VehicleId],
    active: &mut Vec<RequestId>,
    stats: &mut RollingStats,
    now: Seconds,
    start: Seconds,
) -> SimResult<()> {
    info!(epoch = encode_hms(now), "planning epoch");
    let epoch_start = Instant::now();

    // Newly arrived requests join the carry-over pool.
    for (rid, request) in requests.iter() {
        if request.entry_time >= now && request.entry_time < now + settings.interval {
            active.push(rid);
            stats.entry_count += 1;
        }
    }

    // Assignment pipeline.
    let pipeline_start = Instant::now();
    let (mut assigned, _report) = {
        let ctx = AssignCtx {
            network,
            requests: &*requests,
            vehicles: &*vehicles,
            settings,
        };
        assignment(&ctx, all_vehicles, active, now, pool, logs)?
    };
    let pipeline_seconds = pipeline_start.elapsed().as_secs_f64();

    // Trivial assignments (idle vehicle, empty trip) would confuse the
    // rebalancer; drop them.
    assigned.retain(|vid, trip| {
        !(vehicles[*vid].passengers.is_empty() && trip.requests.is_empty())
    });

    // Requests actually served by a trip; the basis of the next carry-over.
    let service_assigned: Vec<RequestId> = assigned
        .values()
        .flat_map(|t| t.requests.iter().copied())
        .collect();

    // Rebalance the leftovers and merge.
    let rebalance_start = Instant::now();
    let relocations = {
        let ctx = AssignCtx {
            network,
            requests: &*requests,
            vehicles: &*vehicles,
            settings,
        };
        rebalance::make_rebalance(&ctx, &assigned, all_vehicles, active)?
    };
    let rebalance_seconds = rebalance_start.elapsed().as_secs_f64();

    let targets: Vec<(u32, rp_core::NodeId)> = relocations
        .iter()
        .filter_map(|(vid, trip)| match trip.kind {
            TripKind::Rebalance { target } => Some((vehicles[*vid].id, target)),
            _ => None,
        })
        .collect();
    logs.rebalance_block(encode_hms(now), &targets);
    assigned.extend(relocations);

    // Every request in the merged assignment is now promised (relocation
    // targets included, for the statistics).
    for trip in assigned.values() {
        for &rid in &trip.requests {
            requests[rid].assigned = true;
        }
    }

    let timings = EpochTimings {
        total: epoch_start.elapsed().as_secs_f64(),
        pipeline: pipeline_seconds,
        rebalance: rebalance_seconds,
    };

    // Advance the fleet one interval, in parallel, then fold the rider
    // events in sequentially.
    let outcomes: Vec<StepOutcome> = {
        let ctx = SimCtx {
            network,
            requests: &*requests,
            settings,
        };
        let slice = vehicles.as_mut_slice();
        pool.install(|| {
            use rayon::prelude::*;
            slice
                .par_iter_mut()
                .enumerate()
                .map(|(i, vehicle)| {
                    let trip: Option<&Trip> = assigned.get(&VehicleId::from_index(i));
                    advance_one(&ctx, vehicle, trip, now)
                })
                .collect::<SimResult<Vec<_>>>()
        })?
    };

    let mut boarded_now: FnvHashSet<RequestId> = FnvHashSet::default();
    for outcome in &outcomes {
        for &rid in &outcome.shared {
            requests[rid].shared = true;
        }
        for &(rid, at) in &outcome.boarded {
            requests[rid].boarding_time = Some(at);
            stats.record_boarding(at - requests[rid].entry_time);
            boarded_now.insert(rid);
        }
        for &(rid, at) in &outcome.alighted {
            requests[rid].alighting_time = Some(at);
            let request = &requests[rid];
            let boarded = request.boarding_time.unwrap_or(at);
            stats.record_alighting(at - boarded, at - boarded - request.ideal_travel, request.shared);
        }
        logs.actions(&outcome.actions);
    }

    logs.results_block(&stats.epoch_block(
        now,
        start,
        timings,
        all_vehicles.len(),
        active.len(),
    ));

    // Refresh the carry-over: service-assigned riders still waiting, window
    // still open.
    *active = service_assigned
        .into_iter()
        .filter(|&rid| !boarded_now.contains(&rid) && now < requests[rid].latest_boarding)
        .collect();

    Ok(())
}

/// Convenience used by tests and the binary: a pool of `n` workers.
pub fn worker_pool(n: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .expect("worker pool")
}
