//! Planned route events.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rp_core::{NodeId, RequestId};

/// One event on a planned route: pick up or drop off `request` at `node`.
///
/// Identity is `(request, is_pickup)` — the node is functionally determined
/// by those two, so equality, ordering and hashing all ignore it.  This is
/// what lets a stop recorded last epoch be matched against a freshly built
/// stop universe.
#[derive(Copy, Clone, Debug)]
pub struct NodeStop {
    pub request: RequestId,
    pub is_pickup: bool,
    pub node: NodeId,
}

impl NodeStop {
    pub fn pickup(request: RequestId, node: NodeId) -> Self {
        NodeStop {
            request,
            is_pickup: true,
            node,
        }
    }

    pub fn dropoff(request: RequestId, node: NodeId) -> Self {
        NodeStop {
            request,
            is_pickup: false,
            node,
        }
    }
}

impl PartialEq for NodeStop {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.is_pickup == other.is_pickup
    }
}

impl Eq for NodeStop {}

impl PartialOrd for NodeStop {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeStop {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.request, self.is_pickup).cmp(&(other.request, other.is_pickup))
    }
}

impl Hash for NodeStop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request.hash(state);
        self.is_pickup.hash(state);
    }
}
