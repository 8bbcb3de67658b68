//! Loaders for the fleet and request files.
//!
//! - `<DATAROOT>/vehicles/<VEHICLE_DATA_FILE>`:
//!   `id,start_node,lat,lon,time,capacity`
//! - `<DATAROOT>/requests/<REQUEST_DATA_FILE>`:
//!   `id,origin_node,o_lon,o_lat,dest_node,d_lon,d_lat,requested_time`
//!
//! Node numbers on disk are 1-based; times in the request file are
//! `(h)h:mm:ss` clock strings.  A short row or a node outside the matrix is
//! fatal input corruption.

use std::fs::File;
use std::io::Read;

use rp_core::{parse_clock, NodeId, Settings};
use rp_network::Network;

use crate::error::{ModelError, ModelResult};
use crate::request::Request;
use crate::store::{RequestStore, VehicleStore};
use crate::vehicle::Vehicle;

/// Load the fleet described by `settings` from disk.
pub fn load_vehicles(settings: &Settings, network: &Network) -> ModelResult<VehicleStore> {
    let path = settings
        .dataroot
        .join("vehicles")
        .join(&settings.vehicle_data_file);
    let file = File::open(&path).map_err(|e| {
        ModelError::Vehicles(format!("cannot open {}: {e}", path.display()))
    })?;
    read_vehicles(file, settings, network.node_count())
}

/// Parse the fleet file.  `VEHICLE_LIMIT` truncates; a non-negative
/// `CARSIZE` overrides the per-row capacity column.
pub fn read_vehicles(
    reader: impl Read,
    settings: &Settings,
    node_count: usize,
) -> ModelResult<VehicleStore> {
    let mut store = VehicleStore::new();
    let mut csv = reader_for(reader);

    for (lineno, record) in csv.records().enumerate() {
        let record = record?;
        if record.len() < 6 {
            return Err(ModelError::Vehicles(format!(
                "row {}: expected id,start_node,lat,lon,time,capacity",
                lineno + 1
            )));
        }
        let id = parse_u32(&record[0])
            .ok_or_else(|| ModelError::Vehicles(format!("row {}: bad id", lineno + 1)))?;
        let node = parse_node(&record[1], node_count)
            .ok_or_else(|| ModelError::Vehicles(format!("row {}: bad start node", lineno + 1)))?;
        let capacity = if settings.carsize >= 0 {
            settings.carsize as usize
        } else {
            record[5].parse().map_err(|_| {
                ModelError::Vehicles(format!("row {}: bad capacity", lineno + 1))
            })?
        };

        store.push(Vehicle::new(id, capacity, node));
        if settings.vehicle_limit > 0 && store.len() >= settings.vehicle_limit {
            break;
        }
    }
    Ok(store)
}

/// Load the requests described by `settings` from disk.
pub fn load_requests(settings: &Settings, network: &Network) -> ModelResult<RequestStore> {
    let path = settings
        .dataroot
        .join("requests")
        .join(&settings.request_data_file);
    let file = File::open(&path).map_err(|e| {
        ModelError::Requests(format!("cannot open {}: {e}", path.display()))
    })?;
    read_requests(file, settings, network)
}

/// Parse the request file, deriving windows and ideal travel times.
pub fn read_requests(
    reader: impl Read,
    settings: &Settings,
    network: &Network,
) -> ModelResult<RequestStore> {
    let mut store = RequestStore::new();
    let mut csv = reader_for(reader);

    for (lineno, record) in csv.records().enumerate() {
        let record = record?;
        if record.len() < 8 {
            return Err(ModelError::Requests(format!(
                "row {}: expected id,origin,o_lon,o_lat,dest,d_lon,d_lat,time",
                lineno + 1
            )));
        }
        let id = parse_u32(&record[0])
            .ok_or_else(|| ModelError::Requests(format!("row {}: bad id", lineno + 1)))?;
        let origin = parse_node(&record[1], network.node_count())
            .ok_or_else(|| ModelError::Requests(format!("row {}: bad origin", lineno + 1)))?;
        let destination = parse_node(&record[4], network.node_count())
            .ok_or_else(|| ModelError::Requests(format!("row {}: bad destination", lineno + 1)))?;
        let entry_time = parse_clock(&record[7])?;

        let ideal = network.node_time(origin, destination);
        let mut request = Request::new(id, origin, destination, entry_time, ideal, settings);
        request.origin_lon = parse_f64(&record[2], lineno, "o_lon")?;
        request.origin_lat = parse_f64(&record[3], lineno, "o_lat")?;
        request.destination_lon = parse_f64(&record[5], lineno, "d_lon")?;
        request.destination_lat = parse_f64(&record[6], lineno, "d_lat")?;

        store.push(request);
    }
    Ok(store)
}

fn reader_for(reader: impl Read) -> csv::Reader<impl Read> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn parse_u32(field: &str) -> Option<u32> {
    field.parse().ok()
}

/// 1-based node number on disk → 0-based [`NodeId`] inside the matrix.
fn parse_node(field: &str, node_count: usize) -> Option<NodeId> {
    let raw: i64 = field.parse().ok()?;
    let index = raw - 1;
    if index < 0 || index as usize >= node_count {
        return None;
    }
    Some(NodeId(index as u32))
}

fn parse_f64(field: &str, lineno: usize, what: &str) -> ModelResult<f64> {
    field
        .parse()
        .map_err(|_| ModelError::Requests(format!("row {}: bad {what}", lineno + 1)))
}
