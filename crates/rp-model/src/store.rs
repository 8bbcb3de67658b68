//! Arenas for requests and vehicles.
//!
//! Plain `Vec` arenas with typed-id indexing.  Handles are assigned in push
//! order and stay valid for the whole run; nothing is ever removed.

use std::ops::{Index, IndexMut};

use rp_core::{RequestId, VehicleId};

use crate::request::Request;
use crate::vehicle::Vehicle;

/// All requests of a run, indexed by [`RequestId`].
#[derive(Default)]
pub struct RequestStore {
    items: Vec<Request>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) -> RequestId {
        let id = RequestId::from_index(self.items.len());
        self.items.push(request);
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate `(handle, request)` in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (RequestId, &Request)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, r)| (RequestId::from_index(i), r))
    }
}

impl Index<RequestId> for RequestStore {
    type Output = Request;
    #[inline]
    fn index(&self, id: RequestId) -> &Request {
        &self.items[id.index()]
    }
}

impl IndexMut<RequestId> for RequestStore {
    #[inline]
    fn index_mut(&mut self, id: RequestId) -> &mut Request {
        &mut self.items[id.index()]
    }
}

/// The fleet, indexed by [`VehicleId`].
#[derive(Default)]
pub struct VehicleStore {
    items: Vec<Vehicle>,
}

impl VehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, vehicle: Vehicle) -> VehicleId {
        let id = VehicleId::from_index(self.items.len());
        self.items.push(vehicle);
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All handles in id order.
    pub fn ids(&self) -> impl Iterator<Item = VehicleId> {
        (0..self.items.len()).map(VehicleId::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, &Vehicle)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (VehicleId::from_index(i), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (VehicleId, &mut Vehicle)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (VehicleId::from_index(i), v))
    }

    /// Mutable access to the raw slice, for the parallel simulator advance.
    pub fn as_mut_slice(&mut self) -> &mut [Vehicle] {
        &mut self.items
    }
}

impl Index<VehicleId> for VehicleStore {
    type Output = Vehicle;
    #[inline]
    fn index(&self, id: VehicleId) -> &Vehicle {
        &self.items[id.index()]
    }
}

impl IndexMut<VehicleId> for VehicleStore {
    #[inline]
    fn index_mut(&mut self, id: VehicleId) -> &mut Vehicle {
        &mut self.items[id.index()]
    }
}
