//! Process-wide configuration.
//!
//! A [`Settings`] value is built once at startup from the command line and is
//! read-only afterwards: every component takes `&Settings` rather than
//! consulting ambient state.  The surface mirrors the dispatcher's
//! `KEY VALUE` argument pairs; an unrecognized key or unparseable value is a
//! fatal configuration error.
//!
//! Tunables the dispatcher does not expose on the command line are plain
//! constants below.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::clock::Seconds;
use crate::error::{CoreError, CoreResult};

// ── Compile-time tunables ─────────────────────────────────────────────────────

/// Penalty per unserved request under the service-rate objective.
pub const MISS_COST: f64 = 10_000_000.0;

/// Weight on ideal travel time of missed requests under the RMT objective.
/// Added to the minimization with a positive sign, as the reference system
/// does; the naming oddity is deliberate and documented.
pub const RMT_REWARD: f64 = 100.0;

/// Keep only the nearest k vehicles per request in the RV graph (0 = off).
pub const PRUNING_RV_K: usize = 0;

/// Keep only the k best co-riders per request in the RR graph (0 = off).
pub const PRUNING_RR_K: usize = 0;

/// Stop-universe size above which the prefix of the previous plan is frozen
/// (FIX_PREFIX planning mode).
pub const LP_LIMITVALUE: usize = 8;

/// Wall-clock cap on the rebalancing LP, seconds.
pub const REBALANCE_TIMELIMIT: f64 = 20.0;

/// Relative MIP gap accepted by the rebalancing LP.
pub const REBALANCE_RELGAP: f64 = 1e-1;

/// Write the per-epoch trip trace to `rtv.log`.
pub const RTV_TRACE: bool = false;

// ── Mode enums ────────────────────────────────────────────────────────────────

/// Fleet assignment algorithm.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Algorithm {
    /// One trip per vehicle, chosen by the full assignment ILP.
    IlpFull,
}

/// How the routing oracle constrains the stop ordering search.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CtspMode {
    /// Unrestricted search over all stop orderings.
    Full,
    /// Chain onboard dropoffs in plan order once the universe is large.
    FixOnboard,
    /// Freeze the prefix of last epoch's plan once the universe is large.
    FixPrefix,
    /// Declared by the reference system; behaves as `Full`.
    MegaTsp,
}

/// Objective minimized by the routing oracle.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CtspObjective {
    /// Vehicle time travelled: arrival at the final stop, minus epoch time.
    Vmt,
    /// Declared, not implemented.
    TotalDropoffTime,
    /// Declared, not implemented.
    TotalWaiting,
}

/// Objective minimized by the assignment ILP.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AssignmentObjective {
    /// Trip costs plus [`MISS_COST`] per missed request.
    ServiceRate,
    /// Trip costs plus [`RMT_REWARD`] × ideal travel per missed request.
    Rmt,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::IlpFull => "ILP_FULL",
        })
    }
}

impl fmt::Display for CtspMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CtspMode::Full => "FULL",
            CtspMode::FixOnboard => "FIX_ONBOARD",
            CtspMode::FixPrefix => "FIX_PREFIX",
            CtspMode::MegaTsp => "MEGA_TSP",
        })
    }
}

impl fmt::Display for CtspObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CtspObjective::Vmt => "CTSP_VMT",
            CtspObjective::TotalDropoffTime => "CTSP_TOTALDROPOFFTIME",
            CtspObjective::TotalWaiting => "CTSP_TOTALWAITING",
        })
    }
}

impl fmt::Display for AssignmentObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignmentObjective::ServiceRate => "AO_SERVICERATE",
            AssignmentObjective::Rmt => "AO_RMT",
        })
    }
}

impl FromStr for Algorithm {
    type Err = CoreError;
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "ILP_FULL" => Ok(Algorithm::IlpFull),
            _ => Err(CoreError::Config(format!("unknown ALGORITHM {s:?}"))),
        }
    }
}

impl FromStr for CtspMode {
    type Err = CoreError;
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "FULL" => Ok(CtspMode::Full),
            "FIX_ONBOARD" => Ok(CtspMode::FixOnboard),
            "FIX_PREFIX" => Ok(CtspMode::FixPrefix),
            "MEGA_TSP" => Ok(CtspMode::MegaTsp),
            _ => Err(CoreError::Config(format!("unknown CTSP {s:?}"))),
        }
    }
}

impl FromStr for CtspObjective {
    type Err = CoreError;
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "CTSP_VMT" => Ok(CtspObjective::Vmt),
            "CTSP_TOTALDROPOFFTIME" => Ok(CtspObjective::TotalDropoffTime),
            "CTSP_TOTALWAITING" => Ok(CtspObjective::TotalWaiting),
            _ => Err(CoreError::Config(format!("unknown CTSP_OBJECTIVE {s:?}"))),
        }
    }
}

impl FromStr for AssignmentObjective {
    type Err = CoreError;
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "AO_SERVICERATE" => Ok(AssignmentObjective::ServiceRate),
            "AO_RMT" => Ok(AssignmentObjective::Rmt),
            _ => Err(CoreError::Config(format!(
                "unknown ASSIGNMENT_OBJECTIVE {s:?}"
            ))),
        }
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// The full run configuration.
///
/// Field names track the command-line keys.  Times that arrive as `HHMMSS`
/// integers (`initial_time`, `final_time`) are stored in that encoding and
/// decoded by the epoch driver; durations (`max_waiting`, `max_detour`,
/// `interval`, dwells) are plain seconds.
#[derive(Clone, Debug)]
pub struct Settings {
    pub dataroot: PathBuf,
    pub results_directory: PathBuf,
    pub timefile: String,
    pub edgecost_file: String,
    pub vehicle_data_file: String,
    pub request_data_file: String,

    /// Keep at most this many vehicles from the fleet file (0 = all).
    pub vehicle_limit: usize,
    /// Uniform vehicle capacity; a negative value defers to the per-row
    /// capacity column of the fleet file.
    pub carsize: i32,

    pub max_waiting: Seconds,
    pub max_detour: Seconds,
    /// Boarding service time charged when a pickup batch ends.
    pub dwell_pickup: Seconds,
    /// Alighting service time charged when a dropoff batch ends.
    pub dwell_alight: Seconds,

    /// First planning epoch, `HHMMSS`.
    pub initial_time: i32,
    /// End of the run, `HHMMSS` (exclusive).
    pub final_time: i32,
    /// Planning interval, seconds.
    pub interval: Seconds,

    pub algorithm: Algorithm,
    pub ctsp: CtspMode,
    pub ctsp_objective: CtspObjective,
    pub assignment_objective: AssignmentObjective,
    /// Reserved blending weight; parsed, currently unused downstream.
    pub alpha: f64,
    /// Idle at stops and serve requests as late as the windows allow.
    /// Simulator-only; unsupported together with nonzero dwells.
    pub last_minute_service: bool,

    /// Per-vehicle budget for RTV enumeration, milliseconds (0 = unlimited).
    pub rtv_timelimit: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dataroot: PathBuf::from("data"),
            results_directory: PathBuf::from("results"),
            timefile: "times.csv".into(),
            edgecost_file: "edges.csv".into(),
            vehicle_data_file: "vehicles.csv".into(),
            request_data_file: "requests.csv".into(),
            vehicle_limit: 1000,
            carsize: 4,
            max_waiting: 300,
            max_detour: 600,
            dwell_pickup: 0,
            dwell_alight: 0,
            initial_time: 0,
            final_time: 240_000,
            interval: 60,
            algorithm: Algorithm::IlpFull,
            ctsp: CtspMode::FixPrefix,
            ctsp_objective: CtspObjective::Vmt,
            assignment_objective: AssignmentObjective::ServiceRate,
            alpha: 0.5,
            last_minute_service: false,
            rtv_timelimit: 0,
        }
    }
}

impl Settings {
    /// Apply one `KEY VALUE` pair from the command line.
    pub fn apply(&mut self, key: &str, value: &str) -> CoreResult<()> {
        match key {
            "DATAROOT" => self.dataroot = trim_dir(value),
            "RESULTS_DIRECTORY" => self.results_directory = trim_dir(value),
            "TIMEFILE" => self.timefile = value.to_owned(),
            "EDGECOST_FILE" => self.edgecost_file = value.to_owned(),
            "VEHICLE_DATA_FILE" => self.vehicle_data_file = value.to_owned(),
            "REQUEST_DATA_FILE" => self.request_data_file = value.to_owned(),
            "VEHICLE_LIMIT" => self.vehicle_limit = parse_num(key, value)?,
            "MAX_WAITING" => self.max_waiting = parse_num(key, value)?,
            "MAX_DETOUR" => self.max_detour = parse_num(key, value)?,
            "CARSIZE" => self.carsize = parse_num(key, value)?,
            "INITIAL_TIME" => self.initial_time = parse_num(key, value)?,
            "FINAL_TIME" => self.final_time = parse_num(key, value)?,
            "INTERVAL" => self.interval = parse_num(key, value)?,
            "RTV_TIMELIMIT" => self.rtv_timelimit = parse_num(key, value)?,
            "ALGORITHM" => self.algorithm = value.parse()?,
            "CTSP" => self.ctsp = value.parse()?,
            "CTSP_OBJECTIVE" => self.ctsp_objective = value.parse()?,
            "ASSIGNMENT_OBJECTIVE" => self.assignment_objective = value.parse()?,
            "ALPHA" => {
                self.alpha = value
                    .parse()
                    .map_err(|_| CoreError::Config(format!("bad value for ALPHA: {value:?}")))?;
            }
            "LAST_MINUTE_SERVICE" => {
                self.last_minute_service = match value.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(CoreError::Config(format!(
                            "LAST_MINUTE_SERVICE expects true/false, got {value:?}"
                        )))
                    }
                };
            }
            _ => return Err(CoreError::Config(format!("unrecognized argument {key:?}"))),
        }
        Ok(())
    }

    /// Reject combinations the pipeline cannot run.  Called once at startup
    /// so misconfiguration never reaches the planning hot path.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ctsp_objective != CtspObjective::Vmt {
            return Err(CoreError::Config(format!(
                "CTSP objective {:?} is declared but not implemented; use CTSP_VMT",
                self.ctsp_objective
            )));
        }
        if self.interval <= 0 {
            return Err(CoreError::Config(format!(
                "INTERVAL must be positive, got {}",
                self.interval
            )));
        }
        Ok(())
    }

    /// Apply a flat `[KEY, VALUE, KEY, VALUE, …]` list.
    ///
    /// A trailing key without a value is fatal.
    pub fn apply_pairs<S: AsRef<str>>(&mut self, pairs: &[S]) -> CoreResult<()> {
        if pairs.len() % 2 != 0 {
            return Err(CoreError::Config(format!(
                "dangling key {:?} without a value",
                pairs[pairs.len() - 1].as_ref()
            )));
        }
        for kv in pairs.chunks_exact(2) {
            self.apply(kv[0].as_ref(), kv[1].as_ref())?;
        }
        Ok(())
    }
}

fn trim_dir(value: &str) -> PathBuf {
    PathBuf::from(value.strip_suffix('/').unwrap_or(value))
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .parse()
        .map_err(|_| CoreError::Config(format!("bad value for {key}: {value:?}")))
}
