//! Unit tests for the routing oracle.

use std::time::Instant;

use rp_core::{CtspMode, NodeId, RequestId, Settings};
use rp_model::{NodeStop, Request, RequestStore, Vehicle};
use rp_network::Network;

use crate::{plan_route, PlanCtx, PlanMode};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Nodes 0,1,2 with times [[0,60,120],[60,0,80],[120,80,0]].
fn line_network() -> Network {
    line_network_with_dwells(0, 0)
}

fn line_network_with_dwells(pickup: i32, alight: i32) -> Network {
    Network::new(
        vec![vec![0, 60, 120], vec![60, 0, 80], vec![120, 80, 0]],
        vec![Vec::new(), Vec::new(), Vec::new()],
        pickup,
        alight,
    )
}

fn settings() -> Settings {
    Settings {
        carsize: 2,
        ctsp: CtspMode::Full,
        ..Settings::default()
    }
}

/// Push a request with windows derived from the default 300/600 settings.
fn push_request(
    store: &mut RequestStore,
    id: u32,
    origin: u32,
    dest: u32,
    entry: i32,
    net: &Network,
    s: &Settings,
) -> RequestId {
    let ideal = net.node_time(NodeId(origin), NodeId(dest));
    store.push(Request::new(
        id,
        NodeId(origin),
        NodeId(dest),
        entry,
        ideal,
        s,
    ))
}

#[cfg(test)]
mod standard {
    use super::*;

    #[test]
    fn single_request_cost_is_drive_plus_ride() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 1, 2, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        let plan = plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, None).unwrap();
        // Drive 0→1 (60) then 1→2 (80).
        assert_eq!(plan.cost, 140);
        assert_eq!(
            plan.stops,
            [NodeStop::pickup(a, NodeId(1)), NodeStop::dropoff(a, NodeId(2))]
        );
    }

    #[test]
    fn shared_pair_prefers_cheaper_dropoff_order() {
        // The worked example: A 0→1, B 0→2, both entering at 0, vehicle at 0.
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let b = push_request(&mut reqs, 2, 0, 2, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        assert_eq!(
            plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, None)
                .unwrap()
                .cost,
            60
        );
        assert_eq!(
            plan_route(&ctx, &v, &[b], PlanMode::Standard, 0, None)
                .unwrap()
                .cost,
            120
        );

        // Pooled: pick both at 0, drop A at 1 (60), drop B at 2 (140); the
        // other dropoff order would cost 200.
        let plan = plan_route(&ctx, &v, &[a, b], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 140);
        assert_eq!(
            plan.stops,
            [
                NodeStop::pickup(a, NodeId(0)),
                NodeStop::pickup(b, NodeId(0)),
                NodeStop::dropoff(a, NodeId(1)),
                NodeStop::dropoff(b, NodeId(2)),
            ]
        );
    }

    #[test]
    fn cost_is_relative_to_epoch_time() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 1_000, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        // At epoch 1_000 the vehicle picks up immediately: cost 60.
        let plan = plan_route(&ctx, &v, &[a], PlanMode::Standard, 1_000, None).unwrap();
        assert_eq!(plan.cost, 60);
    }

    #[test]
    fn waits_for_entry_time() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 200, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        // Arrives at 0 instantly but boards at 200, alights at 260.
        let plan = plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 260);
    }

    #[test]
    fn unreachable_window_is_infeasible() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        // Entered 400 s ago: latest boarding at 300 has passed.
        let a = push_request(&mut reqs, 1, 1, 2, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        assert!(plan_route(&ctx, &v, &[a], PlanMode::Standard, 400, None).is_none());
    }

    #[test]
    fn full_cabin_rejects_new_pickup() {
        let net = line_network();
        // A 100 s boarding window: no seat frees up that fast.
        let s = Settings {
            max_waiting: 100,
            ..settings()
        };
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let b = push_request(&mut reqs, 2, 0, 2, 0, &net, &s);
        let c = push_request(&mut reqs, 3, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };

        let mut v = Vehicle::new(1, 2, NodeId(0));
        v.passengers = vec![a, b];
        v.plan = vec![
            NodeStop::dropoff(a, NodeId(1)),
            NodeStop::dropoff(b, NodeId(2)),
        ];

        // Baseline with just the onboard dropoffs works…
        assert!(plan_route(&ctx, &v, &[], PlanMode::Standard, 0, None).is_some());
        // …but boarding C needs a free seat, and the earliest return to
        // node 0 after a dropoff is at 120 s, past C's window.
        assert!(plan_route(&ctx, &v, &[c], PlanMode::Standard, 0, None).is_none());
    }

    #[test]
    fn vehicle_offset_delays_everything() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let mut v = Vehicle::new(1, 2, NodeId(0));
        v.offset = 45; // still 45 s from reaching node 0

        let plan = plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 45 + 60);
    }

    #[test]
    fn expired_deadline_yields_infeasible() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        let expired = Instant::now();
        assert!(plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, Some(expired)).is_none());
    }
}

#[cfg(test)]
mod dwells {
    use super::*;

    #[test]
    fn pickup_dwell_charged_when_leaving_the_batch() {
        let net = line_network_with_dwells(30, 0);
        let s = Settings {
            dwell_pickup: 30,
            ..settings()
        };
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        // Board at 0, dwell 30 on departure, drive 60.
        let plan = plan_route(&ctx, &v, &[a], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 90);
    }

    #[test]
    fn batched_pickups_share_one_dwell() {
        let net = line_network_with_dwells(30, 0);
        let s = Settings {
            dwell_pickup: 30,
            ..settings()
        };
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let b = push_request(&mut reqs, 2, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(0));

        // Two boardings at node 0 are one batch: a single 30 s dwell.
        let plan = plan_route(&ctx, &v, &[a, b], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 90);
    }
}

#[cfg(test)]
mod memory {
    use super::*;

    #[test]
    fn replays_recorded_plan_at_same_cost() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let b = push_request(&mut reqs, 2, 0, 2, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let mut v = Vehicle::new(1, 2, NodeId(0));

        let plan = plan_route(&ctx, &v, &[a, b], PlanMode::Standard, 0, None).unwrap();
        v.plan = plan.stops.clone();
        v.pending = vec![a, b];

        let replay = plan_route(&ctx, &v, &[a, b], PlanMode::Memory, 0, None).unwrap();
        assert_eq!(replay.cost, plan.cost);
        assert_eq!(replay.stops, plan.stops);
    }

    #[test]
    fn stale_plan_is_infeasible() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 1, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let mut v = Vehicle::new(1, 2, NodeId(0));
        v.plan = vec![
            NodeStop::pickup(a, NodeId(0)),
            NodeStop::dropoff(a, NodeId(1)),
        ];

        // Far past the boarding window, the replay no longer checks out.
        assert!(plan_route(&ctx, &v, &[a], PlanMode::Memory, 1_000, None).is_none());
    }
}

#[cfg(test)]
mod rebalance {
    use super::*;

    #[test]
    fn cost_is_approach_plus_ideal() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let a = push_request(&mut reqs, 1, 0, 2, 0, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 2, NodeId(1));

        let plan = plan_route(&ctx, &v, &[a], PlanMode::Rebalance, 0, None).unwrap();
        assert_eq!(plan.cost, 60 + 120);
        assert_eq!(plan.stops.len(), 2);
        assert_eq!(plan.stops[0].node, NodeId(0));
    }
}

#[cfg(test)]
mod ordering_modes {
    use super::*;

    /// Five riders onboard, dropoffs recorded 2,2,2,1,1.  A free search
    /// serves node 1 first (cost 140); the onboard chain must follow the
    /// recorded order and pays 200.
    fn loaded_vehicle(reqs: &mut RequestStore, net: &Network, s: &Settings) -> Vehicle {
        let mut v = Vehicle::new(1, 5, NodeId(0));
        for i in 0..5 {
            let dest = if i < 3 { 2 } else { 1 };
            let rid = push_request(reqs, 10 + i, 0, dest, 0, net, s);
            v.passengers.push(rid);
            v.plan.push(NodeStop::dropoff(
                rid,
                NodeId(dest),
            ));
        }
        v
    }

    #[test]
    fn full_search_reorders_onboard_dropoffs() {
        let net = line_network();
        let s = settings();
        let mut reqs = RequestStore::new();
        let v = loaded_vehicle(&mut reqs, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let plan = plan_route(&ctx, &v, &[], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 140); // 0→1 (60) then 1→2 (80)
    }

    #[test]
    fn fix_onboard_keeps_recorded_dropoff_order() {
        let net = line_network();
        let s = Settings {
            ctsp: CtspMode::FixOnboard,
            ..settings()
        };
        let mut reqs = RequestStore::new();
        let v = loaded_vehicle(&mut reqs, &net, &s);
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let plan = plan_route(&ctx, &v, &[], PlanMode::Standard, 0, None).unwrap();
        assert_eq!(plan.cost, 200); // 0→2 (120) then 2→1 (80)
    }

    #[test]
    fn fix_prefix_rejects_too_many_new_requests() {
        let net = line_network();
        let s = Settings {
            carsize: 8,
            ctsp: CtspMode::FixPrefix,
            ..Settings::default()
        };
        let mut reqs = RequestStore::new();
        let rids: Vec<_> = (0..5)
            .map(|i| push_request(&mut reqs, i, 0, 1, 0, &net, &s))
            .collect();
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &s,
        };
        let v = Vehicle::new(1, 8, NodeId(0));

        // Ten stops exceed the prefix threshold and all five requests are
        // new: the frozen prefix cannot absorb them.
        assert!(plan_route(&ctx, &v, &rids, PlanMode::Standard, 0, None).is_none());
    }

    #[test]
    fn fix_prefix_replans_pending_requests() {
        let net = line_network();
        let full = Settings {
            carsize: 8,
            ctsp: CtspMode::Full,
            ..Settings::default()
        };
        let mut reqs = RequestStore::new();
        let rids: Vec<_> = (0..5)
            .map(|i| push_request(&mut reqs, i, 0, 1, 0, &net, &full))
            .collect();
        let mut v = Vehicle::new(1, 8, NodeId(0));

        let baseline = {
            let ctx = PlanCtx {
                network: &net,
                requests: &reqs,
                settings: &full,
            };
            plan_route(&ctx, &v, &rids, PlanMode::Standard, 0, None).unwrap()
        };
        v.plan = baseline.stops.clone();
        v.pending = rids.clone();

        let prefix = Settings {
            ctsp: CtspMode::FixPrefix,
            ..full
        };
        let ctx = PlanCtx {
            network: &net,
            requests: &reqs,
            settings: &prefix,
        };
        let replan = plan_route(&ctx, &v, &rids, PlanMode::Standard, 0, None).unwrap();
        assert_eq!(replan.cost, baseline.cost);
    }
}
