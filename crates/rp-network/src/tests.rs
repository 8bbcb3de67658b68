//! Unit tests for rp-network.

use rp_core::NodeId;

use crate::load::{read_edges, read_time_matrix};
use crate::{Arc, Leg, Network};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Three nodes in a line: 0 —60— 1 —80— 2, plus the 0—2 shortcut at 120.
fn line_matrix() -> Vec<Vec<i32>> {
    vec![vec![0, 60, 120], vec![60, 0, 80], vec![120, 80, 0]]
}

fn line_adjacency() -> Vec<Vec<Arc>> {
    vec![
        vec![arc(1, 60), arc(2, 120)],
        vec![arc(0, 60), arc(2, 80)],
        vec![arc(1, 80), arc(0, 120)],
    ]
}

fn arc(target: u32, time: i32) -> Arc {
    Arc {
        target: NodeId(target),
        time,
    }
}

fn line_network() -> Network {
    Network::new(line_matrix(), line_adjacency(), 0, 0)
}

#[cfg(test)]
mod queries {
    use super::*;

    #[test]
    fn node_times() {
        let net = line_network();
        assert_eq!(net.node_time(NodeId(0), NodeId(2)), 120);
        assert_eq!(net.time(Leg::Node(NodeId(1)), NodeId(2)), 80);
    }

    #[test]
    fn dwell_legs_ignore_destination() {
        let net = Network::new(line_matrix(), line_adjacency(), 30, 10);
        assert_eq!(net.time(Leg::PickupDwell, NodeId(0)), 30);
        assert_eq!(net.time(Leg::PickupDwell, NodeId(2)), 30);
        assert_eq!(net.time(Leg::AlightDwell, NodeId(1)), 10);
        assert_eq!(net.time(Leg::Hold, NodeId(2)), 0);
    }

    #[test]
    fn distance_is_time() {
        let net = line_network();
        assert_eq!(
            net.distance(Leg::Node(NodeId(0)), NodeId(2)),
            net.time(Leg::Node(NodeId(0)), NodeId(2))
        );
    }
}

#[cfg(test)]
mod walk {
    use super::*;

    #[test]
    fn trivial_walk() {
        let net = line_network();
        assert_eq!(net.walk_path(NodeId(1), NodeId(1)).unwrap(), [NodeId(1)]);
    }

    #[test]
    fn adjacent_walk() {
        let net = line_network();
        assert_eq!(
            net.walk_path(NodeId(0), NodeId(1)).unwrap(),
            [NodeId(0), NodeId(1)]
        );
    }

    #[test]
    fn multi_step_walk_follows_matrix() {
        // Make the direct 0→2 arc worse than going through 1.
        let mut times = line_matrix();
        times[0][2] = 140;
        times[2][0] = 140;
        let net = Network::new(times, line_adjacency(), 0, 0);
        assert_eq!(
            net.walk_path(NodeId(0), NodeId(2)).unwrap(),
            [NodeId(0), NodeId(1), NodeId(2)]
        );
    }

    #[test]
    fn zero_time_arcs_are_traversed() {
        // 0 -0-> 1 -0-> 2 -50-> 3; matrix says 0→3 takes 50.
        let times = vec![
            vec![0, 0, 0, 50],
            vec![0, 0, 0, 50],
            vec![0, 0, 0, 50],
            vec![50, 50, 50, 0],
        ];
        let adjacency = vec![
            vec![arc(1, 0)],
            vec![arc(2, 0)],
            vec![arc(3, 50)],
            vec![],
        ];
        let net = Network::new(times, adjacency, 0, 0);
        assert_eq!(
            net.walk_path(NodeId(0), NodeId(3)).unwrap(),
            [NodeId(0), NodeId(1), NodeId(2), NodeId(3)]
        );
    }

    #[test]
    fn disconnected_walk_fails() {
        let times = vec![vec![0, 10], vec![10, 0]];
        let adjacency = vec![vec![], vec![]];
        let net = Network::new(times, adjacency, 0, 0);
        assert!(net.walk_path(NodeId(0), NodeId(1)).is_err());
    }
}

#[cfg(test)]
mod loaders {
    use super::*;

    #[test]
    fn matrix_from_text() {
        let text = "0,60,120\n60,0,80\n120,80,0\n";
        let rows = read_time_matrix(text.as_bytes()).unwrap();
        assert_eq!(rows, line_matrix());
    }

    #[test]
    fn ragged_matrix_is_fatal() {
        assert!(read_time_matrix("0,60\n60\n".as_bytes()).is_err());
    }

    #[test]
    fn non_square_matrix_is_fatal() {
        assert!(read_time_matrix("0,60\n60,0\n1,2\n".as_bytes()).is_err());
    }

    #[test]
    fn negative_time_is_fatal() {
        assert!(read_time_matrix("0,-5\n5,0\n".as_bytes()).is_err());
    }

    #[test]
    fn edges_from_text() {
        // 1-based on disk.
        let text = "1,2,60\n2,3,80\n3,1,120\n";
        let adjacency = read_edges(text.as_bytes(), 3).unwrap();
        assert_eq!(adjacency[0].len(), 1);
        assert_eq!(adjacency[0][0].target, NodeId(1));
        assert_eq!(adjacency[0][0].time, 60);
        assert_eq!(adjacency[2][0].target, NodeId(0));
    }

    #[test]
    fn out_of_range_edge_is_fatal() {
        assert!(read_edges("1,9,60\n".as_bytes(), 3).is_err());
        assert!(read_edges("0,1,60\n".as_bytes(), 3).is_err());
    }
}
