//! The fleet assignment integer program.
//!
//! Variables: one binary `e_j` per candidate trip and one binary miss
//! indicator `x_k` per active request.  Constraints: every vehicle picks
//! exactly one of its trips (the baseline empty trip makes this always
//! satisfiable), and every active request is either served by exactly one
//! selected trip or missed — with the miss option removed for requests
//! promised in an earlier epoch, so the solver can never walk back a
//! promise.
//!
//! Solved with HiGHS through `good_lp`.

use std::collections::BTreeMap;
use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::{variable, variables, Expression, Solution, SolverModel, Variable};
use rp_core::{encode_hms, AssignmentObjective, RequestId, Seconds, VehicleId, MISS_COST, RMT_REWARD};
use rp_model::Trip;
use rp_output::{IlpRow, RunLogs};
use tracing::{debug, info};

use crate::error::{AssignError, AssignResult};
use crate::pipeline::AssignCtx;

/// Wall-clock cap on one assignment solve, seconds.
const ILP_TIMELIMIT: f64 = 60.0;
/// Relative MIP gap target.
const ILP_RELGAP: f64 = 1e-8;
/// Absolute MIP gap target.
const ILP_ABSGAP: f64 = 0.0;

/// What one solve reported, as written to `ilp.csv`.
#[derive(Debug, Clone, Copy)]
pub struct SolverReport {
    pub objective: f64,
    pub solver_seconds: f64,
    pub abs_gap: f64,
    pub rel_gap: f64,
    pub assigned: usize,
    pub optimal: bool,
}

/// Choose one trip per vehicle.  Returns the chosen map and the solver
/// report; an empty trip list short-circuits to an empty assignment without
/// touching the solver.
pub fn solve_assignment(
    ctx: &AssignCtx<'_>,
    trip_list: &BTreeMap<VehicleId, Vec<Trip>>,
    active_requests: &[RequestId],
    now: Seconds,
    logs: &RunLogs,
) -> AssignResult<(BTreeMap<VehicleId, Trip>, Option<SolverReport>)> {
    // Flatten in vehicle-id order; the trip index is the variable index.
    let mut flat: Vec<(VehicleId, &Trip)> = Vec::new();
    let mut ranges: Vec<(VehicleId, std::ops::Range<usize>)> = Vec::new();
    let mut trips_of_request: BTreeMap<RequestId, Vec<usize>> = BTreeMap::new();
    for (&vid, trips) in trip_list {
        let start = flat.len();
        for trip in trips {
            for &rid in &trip.requests {
                trips_of_request.entry(rid).or_default().push(flat.len());
            }
            flat.push((vid, trip));
        }
        ranges.push((vid, start..flat.len()));
    }

    if flat.is_empty() {
        return Ok((BTreeMap::new(), None));
    }

    let promised = active_requests
        .iter()
        .filter(|&&r| ctx.requests[r].assigned)
        .count();
    debug!(
        promised,
        active = active_requests.len(),
        trips = flat.len(),
        "assignment ILP"
    );

    let mut vars = variables!();
    let es: Vec<Variable> = (0..flat.len())
        .map(|_| vars.add(variable().binary()))
        .collect();
    let xs: Vec<Variable> = (0..active_requests.len())
        .map(|_| vars.add(variable().binary()))
        .collect();

    let mut objective = Expression::from(0.0);
    for (j, &(_, trip)) in flat.iter().enumerate() {
        objective = objective + trip.cost as f64 * es[j];
    }
    match ctx.settings.assignment_objective {
        AssignmentObjective::ServiceRate => {
            for &x in &xs {
                objective = objective + MISS_COST * x;
            }
        }
        AssignmentObjective::Rmt => {
            // The reward term is added, not subtracted; this matches the
            // operating mode of the reference system.
            for (k, &rid) in active_requests.iter().enumerate() {
                objective = objective + RMT_REWARD * ctx.requests[rid].ideal_travel as f64 * xs[k];
            }
        }
    }

    let mut model = vars
        .minimise(objective)
        .using(highs)
        .set_verbose(false)
        .set_time_limit(ILP_TIMELIMIT)
        .set_mip_rel_gap(ILP_RELGAP)
        .set_mip_abs_gap(ILP_ABSGAP);

    // One trip per vehicle.
    for (_, range) in &ranges {
        let sum = range
            .clone()
            .fold(Expression::from(0.0), |acc, j| acc + es[j]);
        model.add_constraint(sum.eq(1.0));
    }

    // Serve-or-miss per request; promised requests must be served.
    for (k, &rid) in active_requests.iter().enumerate() {
        let sum = trips_of_request
            .get(&rid)
            .into_iter()
            .flatten()
            .fold(Expression::from(0.0), |acc, &j| acc + es[j]);
        if ctx.requests[rid].assigned {
            model.add_constraint(sum.eq(1.0));
        } else {
            model.add_constraint((sum + xs[k]).eq(1.0));
        }
    }

    let solve_start = Instant::now();
    let solution = model
        .solve()
        .map_err(|e| AssignError::Solver(e.to_string()))?;
    let solver_seconds = solve_start.elapsed().as_secs_f64();

    // Decode at the 0.5 threshold.
    let mut chosen: BTreeMap<VehicleId, Trip> = BTreeMap::new();
    let mut trip_cost_total = 0.0;
    for (vid, range) in &ranges {
        for j in range.clone() {
            if solution.value(es[j]) > 0.5 {
                chosen.insert(*vid, flat[j].1.clone());
                trip_cost_total += flat[j].1.cost as f64;
                break;
            }
        }
    }
    let mut miss_total = 0.0;
    for (k, &rid) in active_requests.iter().enumerate() {
        if solution.value(xs[k]) > 0.5 {
            miss_total += match ctx.settings.assignment_objective {
                AssignmentObjective::ServiceRate => MISS_COST,
                AssignmentObjective::Rmt => RMT_REWARD * ctx.requests[rid].ideal_travel as f64,
            };
        }
    }

    let report = SolverReport {
        objective: trip_cost_total + miss_total,
        solver_seconds,
        abs_gap: ILP_ABSGAP,
        rel_gap: 0.0,
        assigned: chosen.len(),
        optimal: true,
    };
    info!(
        assignments = report.assigned,
        objective = report.objective,
        seconds = report.solver_seconds,
        "assignment solved"
    );
    logs.ilp_row(&IlpRow {
        epoch: encode_hms(now),
        objective: report.objective,
        solver_seconds: report.solver_seconds,
        abs_gap: report.abs_gap,
        rel_gap: report.rel_gap,
        assigned: report.assigned,
        optimal: report.optimal,
    });

    Ok((chosen, Some(report)))
}
