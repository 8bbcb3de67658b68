//! Rolling run statistics and the `results.log` block formats.

use rp_core::{encode_hms, Seconds, Settings};
use rp_model::{VehicleState, VehicleStore};

/// Wall-clock durations of one epoch's planning phases, seconds.
#[derive(Debug, Clone, Copy)]
pub struct EpochTimings {
    /// Buffer update + assignment + rebalancing.
    pub total: f64,
    /// The RV→RR→RTV→ILP chain alone.
    pub pipeline: f64,
    pub rebalance: f64,
}

/// Counters accumulated across the whole run.
#[derive(Default)]
pub struct RollingStats {
    pub entry_count: usize,
    pub pickup_count: usize,
    pub dropoff_count: usize,
    pub shared_count: usize,
    pub total_waiting: i64,
    pub total_in_vehicle: i64,
    pub total_delay: i64,
    service_count: usize,
    service_count_reported: usize,
    max_assignment_seconds: f64,
}

impl RollingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_boarding(&mut self, waited: Seconds) {
        self.total_waiting += waited as i64;
        self.pickup_count += 1;
        self.service_count += 1;
    }

    pub fn record_alighting(&mut self, ride: Seconds, delay: Seconds, shared: bool) {
        self.dropoff_count += 1;
        self.total_in_vehicle += ride as i64;
        self.total_delay += delay as i64;
        if shared {
            self.shared_count += 1;
        }
    }

    /// Format the per-epoch metrics block and roll the epoch-delta markers.
    pub fn epoch_block(
        &mut self,
        epoch: Seconds,
        start: Seconds,
        timings: EpochTimings,
        active_vehicles: usize,
        pending_requests: usize,
    ) -> String {
        self.max_assignment_seconds = self.max_assignment_seconds.max(timings.total);
        let served_this_epoch = self.service_count - self.service_count_reported;
        self.service_count_reported = self.service_count;

        let mut block = String::new();
        block.push_str(&format!("TIME STAMP:{}\n", encode_hms(epoch)));
        block.push_str(&format!("SYSTEM TIME: {}\n", system_time()));
        block.push_str(&format!("\tIteration Assignment Time\t{}\n", timings.total));
        block.push_str(&format!(
            "\tMaximum Assignment Time\t{}\n",
            self.max_assignment_seconds
        ));
        block.push_str(&format!("\tILP Assignment Time\t{}\n", timings.pipeline));
        block.push_str(&format!("\tRebalance Time\t{}\n", timings.rebalance));
        block.push_str(&format!("\tActive vehicles\t{active_vehicles}\n"));
        block.push_str(&format!("\tPending requests\t{pending_requests}\n"));
        block.push_str(&format!("\tService Count\t{served_this_epoch}\n"));
        block.push('\n');

        block.push_str(&format!(
            "\tService Rate\t{}\t%\n",
            ratio(100 * self.pickup_count as i64, self.entry_count)
        ));
        block.push_str(&format!(
            "\tAvg Waiting\t{}\n",
            ratio(self.total_waiting, self.pickup_count)
        ));
        block.push_str(&format!(
            "\tAvg Riding\t{}\n",
            ratio(self.total_in_vehicle, self.dropoff_count)
        ));
        block.push_str(&format!(
            "\tAvg Delay\t{}\n",
            ratio(self.total_delay, self.dropoff_count)
        ));
        let mean_passengers = if epoch != start && active_vehicles > 0 {
            self.total_in_vehicle as f64 / ((epoch - start) as f64 * active_vehicles as f64)
        } else {
            0.0
        };
        block.push_str(&format!("\tMean Passen\t{mean_passengers}\n"));
        block.push_str(&format!(
            "\tShared rate\t{}\t%\n",
            ratio(100 * self.shared_count as i64, self.dropoff_count)
        ));
        block.push_str(&format!("\tTotal shared\t{}\n", self.shared_count));
        block
    }

    /// Format the end-of-run summary.
    ///
    /// Requests still assigned and within their window at shutdown count as
    /// served; assigned requests whose window lapsed unboarded are errors.
    pub fn final_block(
        &self,
        end: Seconds,
        start: Seconds,
        settings: &Settings,
        vehicles: &VehicleStore,
        still_pending: &[(Seconds, bool)],
        onboard_rides: &[Seconds],
    ) -> String {
        let mut served = self.pickup_count;
        let mut errors = 0usize;
        for &(entry_time, boarded) in still_pending {
            if boarded {
                continue;
            }
            if entry_time + settings.max_waiting < end {
                errors += 1;
            } else {
                served += 1;
            }
        }

        let mut passenger_time = self.total_in_vehicle;
        for &ride in onboard_rides {
            passenger_time += ride as i64;
        }
        let mean_passengers = if end != start && vehicles.len() > 0 {
            passenger_time as f64 / ((end - start) as f64 * vehicles.len() as f64)
        } else {
            0.0
        };

        let mut idle = 0i64;
        let mut enroute = 0i64;
        let mut rebalancing = 0i64;
        let mut inuse = 0i64;
        for (_, v) in vehicles.iter() {
            idle += v.total_in_state(VehicleState::Idle, end) as i64;
            enroute += v.total_in_state(VehicleState::EnRoute, end) as i64;
            rebalancing += v.total_in_state(VehicleState::Rebalancing, end) as i64;
            inuse += v.total_in_state(VehicleState::InUse, end) as i64;
        }

        let mut block = String::from("FINAL SUMMARY\n");
        block.push_str(&format!(
            "\tService Rate\t{}\t%\n",
            ratio(100 * served as i64, self.entry_count)
        ));
        block.push_str(&format!("\tServed\t{served}\n"));
        block.push_str(&format!("\tError Count\t{errors}\n"));
        block.push_str(&format!("\tMean Passen\t{mean_passengers}\n"));
        block.push_str(&format!("\tTotal Idle\t{idle}\n"));
        block.push_str(&format!("\tTotal En Route\t{enroute}\n"));
        block.push_str(&format!("\tTotal Rebalancing\t{rebalancing}\n"));
        block.push_str(&format!("\tTotal Inuse\t{inuse}\n"));
        block
    }
}

/// The run configuration echo that heads `results.log`.
pub fn run_header(settings: &Settings) -> String {
    let mut header = String::new();
    header.push_str(&format!("DATAROOT {}\n", settings.dataroot.display()));
    header.push_str(&format!(
        "RESULTS_DIRECTORY {}\n",
        settings.results_directory.display()
    ));
    header.push_str(&format!("TIMEFILE {}\n", settings.timefile));
    header.push_str(&format!("EDGECOST_FILE {}\n", settings.edgecost_file));
    header.push_str(&format!("VEHICLE_LIMIT {}\n", settings.vehicle_limit));
    header.push_str(&format!("MAX_WAITING {}\n", settings.max_waiting));
    header.push_str(&format!("MAX_DETOUR {}\n", settings.max_detour));
    header.push_str(&format!(
        "REQUEST_DATA_FILE {}\n",
        settings.request_data_file
    ));
    header.push_str(&format!(
        "VEHICLE_DATA_FILE {}\n",
        settings.vehicle_data_file
    ));
    header.push_str(&format!("CARSIZE {}\n", settings.carsize));
    header.push_str(&format!("INITIAL_TIME {}\n", settings.initial_time));
    header.push_str(&format!("FINAL_TIME {}\n", settings.final_time));
    header.push_str(&format!("ALGORITHM {}\n", settings.algorithm));
    header.push_str(&format!("CTSP {}\n", settings.ctsp));
    header.push_str(&format!("CTSP_OBJECTIVE {}\n", settings.ctsp_objective));
    if settings.last_minute_service {
        header.push_str("LAST_MINUTE_SERVICE Active\n");
    }
    header
}

fn system_time() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

fn ratio(numerator: i64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
