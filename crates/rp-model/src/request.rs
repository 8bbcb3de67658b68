//! Trip requests.

use rp_core::{NodeId, Seconds, Settings};

/// One trip request.
///
/// Window invariants hold by construction:
/// `latest_boarding >= entry_time` and
/// `latest_alighting >= entry_time + ideal_travel`.
#[derive(Clone, Debug)]
pub struct Request {
    /// External id from the request file; used only in log output.
    pub id: u32,
    pub origin: NodeId,
    pub destination: NodeId,

    /// Earliest pickup.
    pub entry_time: Seconds,
    /// `entry_time + MAX_WAITING`.
    pub latest_boarding: Seconds,
    /// `entry_time + ideal_travel + MAX_DETOUR`.
    pub latest_alighting: Seconds,
    /// Network time origin → destination.
    pub ideal_travel: Seconds,

    pub origin_lon: f64,
    pub origin_lat: f64,
    pub destination_lon: f64,
    pub destination_lat: f64,

    /// Promised to a vehicle in some earlier epoch.
    pub assigned: bool,
    /// Shared the cabin with another rider at some point.
    pub shared: bool,
    /// Stamped by the simulator at pickup.
    pub boarding_time: Option<Seconds>,
    /// Stamped by the simulator at dropoff.
    pub alighting_time: Option<Seconds>,
}

impl Request {
    /// Build a request with windows derived from `settings`.
    pub fn new(
        id: u32,
        origin: NodeId,
        destination: NodeId,
        entry_time: Seconds,
        ideal_travel: Seconds,
        settings: &Settings,
    ) -> Self {
        Request {
            id,
            origin,
            destination,
            entry_time,
            latest_boarding: entry_time + settings.max_waiting,
            latest_alighting: entry_time + ideal_travel + settings.max_detour,
            ideal_travel,
            origin_lon: 0.0,
            origin_lat: 0.0,
            destination_lon: 0.0,
            destination_lat: 0.0,
            assigned: false,
            shared: false,
            boarding_time: None,
            alighting_time: None,
        }
    }
}
