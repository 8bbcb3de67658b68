//! Unit tests for rp-output.

use rp_core::NodeId;

use crate::logs::{IlpRow, RunLogs};

fn read(dir: &std::path::Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn ilp_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let logs = RunLogs::open(dir.path(), false).unwrap();
    logs.ilp_row(&IlpRow {
        epoch: 103_000,
        objective: 140.0,
        solver_seconds: 0.02,
        abs_gap: 0.0,
        rel_gap: 0.0,
        assigned: 3,
        optimal: true,
    });
    drop(logs);

    let text = read(dir.path(), "ilp.csv");
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Time\tObj\tSolverTime\tAbsGap\tRelGap\tNumAssigned\tStatus"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("103000\t140\t"));
    assert!(row.ends_with("\t3\tOptimal"));
}

#[test]
fn appends_are_cumulative() {
    let dir = tempfile::tempdir().unwrap();
    {
        let logs = RunLogs::open(dir.path(), false).unwrap();
        logs.actions("1,100,5,\n");
    }
    {
        let logs = RunLogs::open(dir.path(), false).unwrap();
        logs.actions("1,160,6,P R9\n");
    }
    let text = read(dir.path(), "actions.log");
    assert_eq!(text, "1,100,5,\n1,160,6,P R9\n");
}

#[test]
fn rebalance_block_format() {
    let dir = tempfile::tempdir().unwrap();
    let logs = RunLogs::open(dir.path(), false).unwrap();
    logs.rebalance_block(100, &[(7, NodeId(42)), (9, NodeId(3))]);
    drop(logs);

    let text = read(dir.path(), "rebalance.log");
    assert_eq!(text, "TIME STAMP 100\n{'v':7,'t':42}\n{'v':9,'t':3}\n");
}

#[test]
fn rtv_trace_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let logs = RunLogs::open(dir.path(), false).unwrap();
    assert!(!logs.rtv_enabled());
    logs.rtv_block("ignored\n");
    assert!(!dir.path().join("rtv.log").exists());

    let logs = RunLogs::open(dir.path(), true).unwrap();
    assert!(logs.rtv_enabled());
    logs.rtv_block("TIME STAMP 0\n");
    drop(logs);
    assert_eq!(read(dir.path(), "rtv.log"), "TIME STAMP 0\n");
}

#[test]
fn results_blocks_append() {
    let dir = tempfile::tempdir().unwrap();
    let logs = RunLogs::open(dir.path(), false).unwrap();
    logs.results_block("TIME STAMP:100\n\tService Rate\t50\t%\n");
    drop(logs);
    assert!(read(dir.path(), "results.log").contains("Service Rate"));
}
