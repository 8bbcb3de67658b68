//! The run log bundle.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use rp_core::NodeId;
use tracing::warn;

use crate::error::OutputResult;

/// One row of `ilp.csv`.
#[derive(Debug, Clone, Copy)]
pub struct IlpRow {
    /// Epoch time, `HHMMSS`.
    pub epoch: i32,
    pub objective: f64,
    pub solver_seconds: f64,
    pub abs_gap: f64,
    pub rel_gap: f64,
    pub assigned: usize,
    pub optimal: bool,
}

/// All append-only logs of one run.
///
/// Cheap to share: workers hand their prepared payloads to the matching
/// method; the per-file mutex serializes appends.
pub struct RunLogs {
    results: Mutex<File>,
    ilp: Mutex<File>,
    actions: Mutex<File>,
    rebalance: Mutex<File>,
    rtv: Option<Mutex<File>>,
}

impl RunLogs {
    /// Open (creating as needed) the log files under `dir`.  The `ilp.csv`
    /// header is appended up front, matching the append-only convention of
    /// the other files.
    pub fn open(dir: &Path, rtv_trace: bool) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let logs = RunLogs {
            results: Mutex::new(append_file(dir, "results.log")?),
            ilp: Mutex::new(append_file(dir, "ilp.csv")?),
            actions: Mutex::new(append_file(dir, "actions.log")?),
            rebalance: Mutex::new(append_file(dir, "rebalance.log")?),
            rtv: if rtv_trace {
                Some(Mutex::new(append_file(dir, "rtv.log")?))
            } else {
                None
            },
        };
        logs.append(
            &logs.ilp,
            "ilp.csv",
            "Time\tObj\tSolverTime\tAbsGap\tRelGap\tNumAssigned\tStatus\n",
        );
        Ok(logs)
    }

    /// Append a pre-formatted block to `results.log`.
    pub fn results_block(&self, block: &str) {
        self.append(&self.results, "results.log", block);
    }

    /// Append one solve row to `ilp.csv`.
    pub fn ilp_row(&self, row: &IlpRow) {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.epoch,
            row.objective,
            row.solver_seconds,
            row.abs_gap,
            row.rel_gap,
            row.assigned,
            if row.optimal { "Optimal" } else { "Suboptimal" },
        );
        self.append(&self.ilp, "ilp.csv", &line);
    }

    /// Append one vehicle's event payload (possibly many lines) to
    /// `actions.log`.
    pub fn actions(&self, payload: &str) {
        if payload.is_empty() {
            return;
        }
        self.append(&self.actions, "actions.log", payload);
    }

    /// Append one epoch's relocation targets to `rebalance.log`.
    pub fn rebalance_block(&self, epoch: i32, targets: &[(u32, NodeId)]) {
        let mut block = format!("TIME STAMP {epoch}\n");
        for (vehicle, target) in targets {
            block.push_str(&format!("{{'v':{vehicle},'t':{}}}\n", target.0));
        }
        self.append(&self.rebalance, "rebalance.log", &block);
    }

    /// Whether the per-epoch trip trace is enabled.
    pub fn rtv_enabled(&self) -> bool {
        self.rtv.is_some()
    }

    /// Append one epoch's trip trace to `rtv.log`, if enabled.
    pub fn rtv_block(&self, payload: &str) {
        if let Some(rtv) = &self.rtv {
            self.append(rtv, "rtv.log", payload);
        }
    }

    fn append(&self, file: &Mutex<File>, name: &str, payload: &str) {
        let mut guard = match file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = guard.write_all(payload.as_bytes()) {
            warn!(file = name, error = %e, "dropping log payload");
        }
    }
}

fn append_file(dir: &Path, name: &str) -> OutputResult<File> {
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(name))?)
}
