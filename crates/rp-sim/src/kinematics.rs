//! Per-vehicle advance of one planning interval.
//!
//! Executes the vehicle's job along the road graph: finish the residual
//! segment, trace waypoints stop by stop, wait for early pickups, serve the
//! stop, charge the batched dwell.  Whatever does not fit in the interval is
//! carried over in `(prev, node, offset)` — including partial waits and
//! dwells, whose remainder is parked against the matching pseudo-leg.
//!
//! Event codes in the `actions.log` payload: nodes passed get a bare line,
//! `W` marks the end of waiting at a stop, `P`/`A` a pickup/alight (with
//! `R<id>`), `R` the end of a relocation, `D` the end of a dwell batch.

use fnv::FnvHashSet;
use rp_core::{encode_hms, RequestId, Seconds, Settings};
use rp_model::{NodeStop, RequestStore, Trip, TripKind, Vehicle, VehicleState};
use rp_network::{Leg, Network};
use rp_planner::{plan_route, PlanCtx, PlanMode};

use crate::error::{SimError, SimResult};

/// Read-only world state for the advance phase.
#[derive(Copy, Clone)]
pub struct SimCtx<'a> {
    pub network: &'a Network,
    pub requests: &'a RequestStore,
    pub settings: &'a Settings,
}

impl<'a> SimCtx<'a> {
    fn plan_ctx(&self) -> PlanCtx<'a> {
        PlanCtx {
            network: self.network,
            requests: self.requests,
            settings: self.settings,
        }
    }
}

/// Rider events produced by one vehicle's advance, applied to the request
/// arena after the parallel phase.
#[derive(Default)]
pub struct StepOutcome {
    /// `actions.log` payload (one write per vehicle per epoch).
    pub actions: String,
    pub boarded: Vec<(RequestId, Seconds)>,
    pub alighted: Vec<(RequestId, Seconds)>,
    /// Riders who shared the cabin this interval.
    pub shared: Vec<RequestId>,
}

/// What the vehicle executes this interval.
enum Job {
    /// Serve the ordered stop plan.
    Serve(Vec<NodeStop>),
    /// Drive empty toward a relocation target.
    Relocate {
        target: rp_core::NodeId,
        rider: Option<RequestId>,
    },
}

/// Advance one vehicle by one interval.
pub fn advance_one(
    ctx: &SimCtx<'_>,
    vehicle: &mut Vehicle,
    trip: Option<&Trip>,
    now: Seconds,
) -> SimResult<StepOutcome> {
    vehicle.pending.clear();

    let has_job = trip.is_some_and(|t| {
        !t.requests.is_empty() || matches!(t.kind, TripKind::Rebalance { .. })
    });

    if has_job || !vehicle.passengers.is_empty() {
        move_vehicle(ctx, vehicle, trip, now)
    } else if vehicle.offset > 0 {
        Ok(move_jobless(ctx, vehicle, now))
    } else {
        vehicle.plan.clear();
        Ok(StepOutcome::default())
    }
}

/// A vehicle with no job finishing its current road segment.
fn move_jobless(ctx: &SimCtx<'_>, vehicle: &mut Vehicle, now: Seconds) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if vehicle.offset <= ctx.settings.interval {
        outcome.actions = format!(
            "{},{},{},\n",
            vehicle.id,
            encode_hms(now + vehicle.offset),
            vehicle.node.0
        );
        let distance = ctx.network.distance(vehicle.prev, vehicle.node);
        vehicle.add_distance(distance as f64);
        vehicle.prev = Leg::Node(vehicle.node);
        vehicle.offset = 0;
    } else {
        vehicle.offset -= ctx.settings.interval;
    }
    vehicle.plan.clear();
    outcome
}

fn job_for(
    ctx: &SimCtx<'_>,
    vehicle: &Vehicle,
    trip: Option<&Trip>,
    now: Seconds,
) -> SimResult<Job> {
    match trip {
        Some(t) => match t.kind {
            TripKind::Rebalance { target } => Ok(Job::Relocate {
                target,
                rider: t.requests.first().copied(),
            }),
            _ if !t.stops.is_empty() => Ok(Job::Serve(t.stops.clone())),
            kind => {
                // Stops were not materialized; re-plan the same trip.
                let mode = if kind == TripKind::Memory {
                    PlanMode::Memory
                } else {
                    PlanMode::Standard
                };
                let plan = plan_route(&ctx.plan_ctx(), vehicle, &t.requests, mode, now, None)
                    .ok_or(SimError::PlanVanished {
                        vehicle: vehicle.id,
                    })?;
                Ok(Job::Serve(plan.stops))
            }
        },
        // No trip but riders onboard: plan their dropoffs afresh.
        None => {
            let plan = plan_route(&ctx.plan_ctx(), vehicle, &[], PlanMode::Standard, now, None)
                .ok_or(SimError::PlanVanished {
                    vehicle: vehicle.id,
                })?;
            Ok(Job::Serve(plan.stops))
        }
    }
}

fn move_vehicle(
    ctx: &SimCtx<'_>,
    vehicle: &mut Vehicle,
    trip: Option<&Trip>,
    now: Seconds,
) -> SimResult<StepOutcome> {
    let job = job_for(ctx, vehicle, trip, now)?;
    let trip_requests: Vec<RequestId> = trip.map(|t| t.requests.clone()).unwrap_or_default();

    vehicle.rebalance_target = match &job {
        Job::Relocate { target, .. } => Some(*target),
        Job::Serve(_) => None,
    };

    let mut outcome = StepOutcome::default();
    let mut onboard: FnvHashSet<RequestId> = vehicle.passengers.iter().copied().collect();
    let mut not_picked_up: FnvHashSet<RequestId> = trip_requests.iter().copied().collect();

    match &job {
        Job::Serve(path) if !path.is_empty() && vehicle.passengers.is_empty() => {
            vehicle.set_state(VehicleState::EnRoute, now);
        }
        Job::Relocate { .. } => vehicle.set_state(VehicleState::Rebalancing, now),
        _ => {}
    }

    let mut budget = ctx.settings.interval;
    let mut clock = now;

    // Finish (or keep chipping at) the current road segment.
    if vehicle.offset < budget {
        clock += vehicle.offset;
        budget -= vehicle.offset;
        vehicle.offset = 0;
        vehicle.prev = Leg::Node(vehicle.node);
        outcome.actions.push_str(&format!(
            "{},{},{},\n",
            vehicle.id,
            encode_hms(clock),
            vehicle.node.0
        ));
    } else {
        clock += budget;
        vehicle.offset -= budget;
        budget = 0;
    }

    let steps: Vec<(rp_core::NodeId, Option<&NodeStop>)> = match &job {
        Job::Serve(path) => path.iter().map(|s| (s.node, Some(s))).collect(),
        Job::Relocate { target, .. } => vec![(*target, None)],
    };
    let relocating = matches!(&job, Job::Relocate { .. });

    // Under last-minute service every departure is postponed to the latest
    // instant that still meets all downstream windows.
    let latest_start = if ctx.settings.last_minute_service && !relocating {
        match &job {
            Job::Serve(path) => Some(latest_starts(ctx, vehicle, path)),
            Job::Relocate { .. } => None,
        }
    } else {
        None
    };

    let mut completed = 0usize;
    'steps: for (x, &(target_node, stop)) in steps.iter().enumerate() {
        if budget <= 0 {
            break;
        }

        if let Some(latest) = &latest_start {
            let delay = latest[x] - clock;
            if delay < 0 {
                return Err(SimError::LateStart {
                    vehicle: vehicle.id,
                });
            }
            clock += delay;
            budget -= delay;
        }

        // Trace the on-road waypoints toward this stop.
        let waypoints = ctx.network.walk_path(vehicle.node, target_node)?;
        if waypoints.len() == 1 {
            vehicle.prev = Leg::Node(waypoints[0]);
            vehicle.node = waypoints[0];
            vehicle.offset = 0;
        }
        for pair in waypoints.windows(2) {
            let (origin, destination) = (pair[0], pair[1]);
            let leg_time = ctx.network.node_time(origin, destination);
            vehicle.prev = Leg::Node(origin);
            vehicle.node = destination;

            if leg_time >= budget {
                clock += budget;
                vehicle.offset = leg_time - budget;
                budget = 0;
                break 'steps;
            }
            clock += leg_time;
            budget -= leg_time;
            let distance = ctx.network.distance(Leg::Node(origin), destination);
            vehicle.add_distance(distance as f64);
            vehicle.prev = Leg::Node(destination);
            outcome.actions.push_str(&format!(
                "{},{},{},\n",
                vehicle.id,
                encode_hms(clock),
                destination.0
            ));
        }

        if budget <= 0 {
            break;
        }

        // Wait for an early rider.
        let rider = match (stop, &job) {
            (Some(s), _) => Some(s.request),
            (None, Job::Relocate { rider, .. }) => *rider,
            _ => None,
        };
        if let Some(rid) = rider {
            let entry = ctx.requests[rid].entry_time;
            if entry >= clock {
                let waiting = entry - clock;
                if waiting >= budget {
                    vehicle.prev = Leg::Hold;
                    vehicle.offset = waiting - budget;
                    budget = 0;
                    break;
                }
                clock += waiting;
                budget -= waiting;
            }
        }

        outcome.actions.push_str(&format!(
            "{},{},{},W\n",
            vehicle.id,
            encode_hms(clock),
            target_node.0
        ));

        completed += 1;
        let rider_label = rider.map_or(-1, |r| ctx.requests[r].id as i64);
        let code = match stop {
            None => 'R',
            Some(s) if s.is_pickup => 'P',
            Some(_) => 'A',
        };
        outcome.actions.push_str(&format!(
            "{},{},{},{}R{}\n",
            vehicle.id,
            encode_hms(clock),
            target_node.0,
            code,
            rider_label
        ));

        // End of a relocation: park and become available again.
        if relocating {
            vehicle.rebalance_target = None;
            vehicle.set_state(VehicleState::Idle, clock);
            break;
        }
        let stop = stop.expect("serve step has a stop");

        if stop.is_pickup {
            outcome.boarded.push((stop.request, clock));
            not_picked_up.remove(&stop.request);
            onboard.insert(stop.request);
            vehicle.set_state(VehicleState::InUse, clock);
            if onboard.len() > 1 {
                outcome.shared.extend(onboard.iter().copied());
            }
        } else {
            outcome.alighted.push((stop.request, clock));
            onboard.remove(&stop.request);
            if onboard.is_empty() {
                vehicle.set_state(VehicleState::Idle, clock);
            }
        }

        // Batched dwell: charged when the next stop leaves this batch.
        let next = steps.get(x + 1).and_then(|&(_, s)| s);
        let batch_ends =
            next.is_none_or(|n| n.is_pickup != stop.is_pickup || n.node != target_node);
        let dwell_leg = match (stop.is_pickup, batch_ends) {
            (false, true) => Leg::AlightDwell,
            (true, true) => Leg::PickupDwell,
            _ => Leg::Node(target_node),
        };
        let dwell = ctx.network.time(dwell_leg, vehicle.node);
        if dwell >= budget {
            vehicle.prev = dwell_leg;
            vehicle.offset = dwell - budget;
            budget = 0;
            break;
        }
        clock += dwell;
        budget -= dwell;
        outcome.actions.push_str(&format!(
            "{},{},{},D\n",
            vehicle.id,
            encode_hms(clock),
            target_node.0
        ));
    }

    // Carry the rest of the plan (and the not-yet-boarded riders) over.
    let mut passengers: Vec<RequestId> = onboard.into_iter().collect();
    passengers.sort_unstable();
    vehicle.passengers = passengers;

    vehicle.plan.clear();
    if let Job::Serve(path) = &job {
        vehicle.plan.extend_from_slice(&path[completed..]);
        let mut pending: Vec<RequestId> = not_picked_up.into_iter().collect();
        pending.sort_unstable();
        vehicle.pending = pending;
    } else {
        // Relocating vehicles count as idle once the interval is spent,
        // reached or not.
        vehicle.set_state(VehicleState::Idle, clock);
    }

    Ok(outcome)
}

/// For every step, the latest departure time that still meets each window
/// downstream (last-minute service).
fn latest_starts(ctx: &SimCtx<'_>, vehicle: &Vehicle, path: &[NodeStop]) -> Vec<Seconds> {
    let mut latest_execution: Vec<Seconds> = Vec::with_capacity(path.len());
    let mut durations: Vec<Seconds> = Vec::with_capacity(path.len());
    let mut here = vehicle.node;
    for stop in path {
        let request = &ctx.requests[stop.request];
        latest_execution.push(if stop.is_pickup {
            request.latest_boarding
        } else {
            request.latest_alighting
        });
        durations.push(ctx.network.node_time(here, stop.node));
        here = stop.node;
    }

    let mut latest_start = vec![0; path.len()];
    for i in (0..path.len()).rev() {
        latest_start[i] = latest_execution[i] - durations[i];
        if i > 0 {
            latest_execution[i - 1] = latest_execution[i - 1].min(latest_start[i]);
        }
    }
    latest_start
}
