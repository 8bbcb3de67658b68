//! Loaders for the map inputs.
//!
//! Two files live under `<DATAROOT>/map/`:
//!
//! - the travel-time matrix: one row per node, comma-separated integer
//!   seconds, column `j` of row `i` = time(i, j);
//! - the edge list: `origin,dest,length` rows with 1-based node numbers,
//!   defining the road adjacency used for path reconstruction.
//!
//! The matrix is a number grid, not a table, so it is parsed with a plain
//! line splitter; the edge list goes through the `csv` reader.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use rp_core::{NodeId, Seconds, Settings};

use crate::error::{NetworkError, NetworkResult};
use crate::network::{Arc, Network};

impl Network {
    /// Load the network described by `settings` from disk.
    pub fn load(settings: &Settings) -> NetworkResult<Network> {
        let map = settings.dataroot.join("map");
        let times = read_time_matrix(BufReader::new(File::open(map.join(&settings.timefile))?))?;
        let adjacency = read_edges(File::open(map.join(&settings.edgecost_file))?, times.len())?;
        Ok(Network::new(
            times,
            adjacency,
            settings.dwell_pickup,
            settings.dwell_alight,
        ))
    }
}

/// Parse the dense travel-time matrix.
///
/// Every row must have the same width and entries must be non-negative; a
/// violation is fatal input corruption.
pub fn read_time_matrix(reader: impl BufRead) -> NetworkResult<Vec<Vec<Seconds>>> {
    let mut rows: Vec<Vec<Seconds>> = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::with_capacity(rows.first().map_or(0, Vec::len));
        for field in line.split(',') {
            let value: Seconds = field.trim().parse().map_err(|_| {
                NetworkError::Matrix(format!("row {}: bad entry {field:?}", lineno + 1))
            })?;
            if value < 0 {
                return Err(NetworkError::Matrix(format!(
                    "row {}: negative travel time {value}",
                    lineno + 1
                )));
            }
            row.push(value);
        }
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(NetworkError::Matrix(format!(
                    "row {} has {} columns, expected {}",
                    lineno + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(NetworkError::Matrix("matrix file is empty".into()));
    }
    if rows.len() != rows[0].len() {
        return Err(NetworkError::Matrix(format!(
            "matrix is {}x{}, expected square",
            rows.len(),
            rows[0].len()
        )));
    }
    Ok(rows)
}

/// Parse the `origin,dest,length` edge list into an adjacency list sized to
/// `node_count`.  Node numbers in the file are 1-based.
pub fn read_edges(reader: impl Read, node_count: usize) -> NetworkResult<Vec<Vec<Arc>>> {
    let mut adjacency = vec![Vec::new(); node_count];
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    for (lineno, record) in csv.records().enumerate() {
        let record = record?;
        if record.len() < 3 {
            return Err(NetworkError::Edges(format!(
                "row {}: expected origin,dest,length",
                lineno + 1
            )));
        }
        let origin = parse_node(&record[0], node_count, lineno)?;
        let dest = parse_node(&record[1], node_count, lineno)?;
        let time: Seconds = record[2]
            .parse()
            .map_err(|_| NetworkError::Edges(format!("row {}: bad length", lineno + 1)))?;
        if time < 0 {
            return Err(NetworkError::Edges(format!(
                "row {}: negative edge time {time}",
                lineno + 1
            )));
        }
        adjacency[origin.index()].push(Arc { target: dest, time });
    }
    Ok(adjacency)
}

fn parse_node(field: &str, node_count: usize, lineno: usize) -> NetworkResult<NodeId> {
    let raw: i64 = field
        .parse()
        .map_err(|_| NetworkError::Edges(format!("row {}: bad node {field:?}", lineno + 1)))?;
    let index = raw - 1; // 1-based on disk
    if index < 0 || index as usize >= node_count {
        return Err(NetworkError::Edges(format!(
            "row {}: node {raw} outside matrix of {node_count}",
            lineno + 1
        )));
    }
    Ok(NodeId(index as u32))
}
