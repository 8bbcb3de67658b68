//! Unit tests for the simulation layer.

use rp_core::{CtspMode, NodeId, RequestId, Settings};
use rp_model::{NodeStop, Request, RequestStore, Trip, TripKind, Vehicle, VehicleStore};
use rp_network::{Arc, Leg, Network};
use rp_output::RunLogs;

use crate::driver::{self, worker_pool};
use crate::kinematics::{advance_one, SimCtx};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn arc(target: u32, time: i32) -> Arc {
    Arc {
        target: NodeId(target),
        time,
    }
}

/// The worked-example line world, with road arcs so vehicles can walk it.
fn line_network() -> Network {
    Network::new(
        vec![vec![0, 60, 120], vec![60, 0, 80], vec![120, 80, 0]],
        vec![
            vec![arc(1, 60), arc(2, 120)],
            vec![arc(0, 60), arc(2, 80)],
            vec![arc(1, 80), arc(0, 120)],
        ],
        0,
        0,
    )
}

fn settings() -> Settings {
    Settings {
        carsize: 2,
        ctsp: CtspMode::Full,
        ..Settings::default()
    }
}

fn push_request(store: &mut RequestStore, id: u32, origin: u32, dest: u32, entry: i32) -> RequestId {
    let net = line_network();
    let ideal = net.node_time(NodeId(origin), NodeId(dest));
    store.push(Request::new(
        id,
        NodeId(origin),
        NodeId(dest),
        entry,
        ideal,
        &settings(),
    ))
}

#[cfg(test)]
mod kinematics {
    use super::*;

    #[test]
    fn pickup_and_carryover_across_the_interval() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0);
        let ctx = SimCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(0));
        let trip = Trip {
            requests: vec![a],
            stops: vec![NodeStop::pickup(a, NodeId(0)), NodeStop::dropoff(a, NodeId(1))],
            cost: 60,
            kind: TripKind::Standard,
        };

        let outcome = advance_one(&ctx, &mut v, Some(&trip), 0).unwrap();

        assert_eq!(outcome.boarded, vec![(a, 0)]);
        assert!(outcome.alighted.is_empty());
        assert!(outcome.actions.contains("1,0,0,W\n"));
        assert!(outcome.actions.contains("1,0,0,PR1\n"));
        // Mid-drive toward node 1, exactly at the boundary.
        assert_eq!(v.node, NodeId(1));
        assert_eq!(v.offset, 0);
        assert_eq!(v.passengers, vec![a]);
        assert!(v.pending.is_empty());
        assert_eq!(v.plan, vec![NodeStop::dropoff(a, NodeId(1))]);
    }

    #[test]
    fn dropoff_on_the_following_interval() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0);
        let ctx = SimCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(0));
        let board = Trip {
            requests: vec![a],
            stops: vec![NodeStop::pickup(a, NodeId(0)), NodeStop::dropoff(a, NodeId(1))],
            cost: 60,
            kind: TripKind::Standard,
        };
        advance_one(&ctx, &mut v, Some(&board), 0).unwrap();

        let keep = Trip {
            requests: vec![],
            stops: v.plan.clone(),
            cost: 0,
            kind: TripKind::Memory,
        };
        let outcome = advance_one(&ctx, &mut v, Some(&keep), 60).unwrap();

        assert_eq!(outcome.alighted, vec![(a, 60)]);
        assert!(outcome.actions.contains("1,100,1,AR1\n"));
        assert!(v.passengers.is_empty());
        assert!(v.plan.is_empty());
    }

    #[test]
    fn jobless_vehicle_finishes_its_segment() {
        let net = line_network();
        let s = settings();
        let reqs = RequestStore::new();
        let ctx = SimCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(1));
        v.prev = Leg::Node(NodeId(0));
        v.offset = 30;

        let outcome = advance_one(&ctx, &mut v, None, 0).unwrap();
        assert_eq!(v.offset, 0);
        assert!(outcome.actions.contains("1,30,1,\n"));
    }

    #[test]
    fn waits_for_an_early_rider() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 100);
        let ctx = SimCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(0));
        let trip = Trip {
            requests: vec![a],
            stops: vec![NodeStop::pickup(a, NodeId(0)), NodeStop::dropoff(a, NodeId(1))],
            cost: 160,
            kind: TripKind::Standard,
        };

        // Interval 60, rider enters at 100: the wait does not fit, the
        // remainder is parked against the hold pseudo-leg.
        let outcome = advance_one(&ctx, &mut v, Some(&trip), 0).unwrap();
        assert!(outcome.boarded.is_empty());
        assert_eq!(v.prev, Leg::Hold);
        assert_eq!(v.offset, 40);
        assert_eq!(v.pending, vec![a]);

        // Next interval: the hold drains, the rider boards at 100.
        let keep = Trip {
            requests: vec![a],
            stops: v.plan.clone(),
            cost: 100,
            kind: TripKind::Memory,
        };
        let outcome = advance_one(&ctx, &mut v, Some(&keep), 60).unwrap();
        assert_eq!(outcome.boarded, vec![(a, 100)]);
    }

    #[test]
    fn relocation_drives_and_survives_interruption() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let r = push_request(&mut reqs, 9, 2, 1, 0);
        let ctx = SimCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(0));
        let trip = Trip {
            requests: vec![r],
            stops: vec![],
            cost: 120,
            kind: TripKind::Rebalance { target: NodeId(2) },
        };

        let outcome = advance_one(&ctx, &mut v, Some(&trip), 0).unwrap();
        assert!(outcome.boarded.is_empty());
        assert_eq!(v.node, NodeId(2));
        assert_eq!(v.offset, 60);
        assert_eq!(v.rebalance_target, Some(NodeId(2)));

        // Continuation trip carries no rider; the vehicle still reaches the
        // target and parks.
        let cont = Trip {
            requests: vec![],
            stops: vec![],
            cost: 0,
            kind: TripKind::Rebalance { target: NodeId(2) },
        };
        advance_one(&ctx, &mut v, Some(&cont), 60).unwrap();
        assert_eq!(v.offset, 0);
        let outcome = advance_one(&ctx, &mut v, Some(&cont), 120).unwrap();
        assert_eq!(v.rebalance_target, None);
        assert!(outcome.actions.contains("RR-1\n"));
    }
}

#[cfg(test)]
mod epochs {
    use super::*;

    /// The worked example end to end: three epochs, one vehicle, requests
    /// A (0→1) and B (0→2) pooled onto it.
    #[test]
    fn worked_example_full_run() {
        let dir = tempfile::tempdir().unwrap();
        let logs = RunLogs::open(dir.path(), false).unwrap();
        let net = line_network();
        let s = Settings {
            initial_time: 0,
            final_time: 300, // 00:03:00 — epochs at 0, 60, 120
            ..settings()
        };

        let mut requests = RequestStore::new();
        let a = push_request(&mut requests, 1, 0, 1, 0);
        let b = push_request(&mut requests, 2, 0, 2, 0);
        let mut vehicles = VehicleStore::new();
        let v = vehicles.push(Vehicle::new(1, 2, NodeId(0)));

        let pool = worker_pool(1);
        driver::run(&s, &net, &mut requests, &mut vehicles, &pool, &logs).unwrap();
        drop(logs);

        // Both riders picked up immediately and dropped in pooled order.
        assert_eq!(requests[a].boarding_time, Some(0));
        assert_eq!(requests[b].boarding_time, Some(0));
        assert_eq!(requests[a].alighting_time, Some(60));
        assert_eq!(requests[b].alighting_time, Some(140));
        assert!(requests[a].shared);
        assert!(requests[b].shared);
        assert!(requests[a].assigned);
        assert!(vehicles[v].passengers.is_empty());

        let actions = std::fs::read_to_string(dir.path().join("actions.log")).unwrap();
        assert!(actions.contains("PR1"));
        assert!(actions.contains("PR2"));
        assert!(actions.contains("AR1"));
        assert!(actions.contains("AR2"));

        let results = std::fs::read_to_string(dir.path().join("results.log")).unwrap();
        assert!(results.contains("CTSP FULL"));
        assert!(results.contains("TIME STAMP:0"));
        assert!(results.contains("FINAL SUMMARY"));
        assert!(results.contains("\tService Rate\t100\t%"));

        let ilp = std::fs::read_to_string(dir.path().join("ilp.csv")).unwrap();
        assert!(ilp.lines().count() >= 4); // header + one row per epoch

        let rebalance = std::fs::read_to_string(dir.path().join("rebalance.log")).unwrap();
        assert!(rebalance.contains("TIME STAMP 0"));
    }

    /// An unreachable request is missed, stays unassigned, and leaves the
    /// pool; the vehicle relocates toward it instead.
    #[test]
    fn missed_request_triggers_rebalancing() {
        let dir = tempfile::tempdir().unwrap();
        let logs = RunLogs::open(dir.path(), false).unwrap();
        let net = line_network();
        let s = Settings {
            initial_time: 0,
            final_time: 100, // one epoch
            max_waiting: 60,
            ..settings()
        };

        let mut requests = RequestStore::new();
        // Origin two minutes away, window one minute: unservable.
        let ideal = net.node_time(NodeId(2), NodeId(1));
        let r = requests.push(Request::new(1, NodeId(2), NodeId(1), 0, ideal, &s));
        let mut vehicles = VehicleStore::new();
        let v = vehicles.push(Vehicle::new(1, 2, NodeId(0)));

        let pool = worker_pool(1);
        driver::run(&s, &net, &mut requests, &mut vehicles, &pool, &logs).unwrap();
        drop(logs);

        assert_eq!(requests[r].boarding_time, None);
        // Consumed as a relocation target.
        assert!(requests[r].assigned);
        assert_eq!(vehicles[v].rebalance_target, Some(NodeId(2)));

        let rebalance = std::fs::read_to_string(dir.path().join("rebalance.log")).unwrap();
        assert!(rebalance.contains("{'v':1,'t':2}"));
    }
}
