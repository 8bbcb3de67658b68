//! Strongly typed, zero-cost identifier wrappers.
//!
//! `RequestId` and `VehicleId` are *arena handles*: positions in the request
//! and vehicle stores, assigned in load order.  They are distinct from the
//! external ids carried in the input CSVs (those live on the structs and are
//! only used in log output).  `NodeId` indexes the travel-time matrix.
//!
//! All ids are `Copy + Ord + Hash` so they can key maps and sorted sets
//! without ceremony; where iteration order matters downstream, sorting by id
//! gives the deterministic order the pipeline relies on.

use std::fmt;

/// Generate a typed id wrapper around `u32`.
macro_rules! arena_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident, $short:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub u32);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Build from an arena position.
            ///
            /// # Panics
            /// Panics if `n` does not fit in `u32` (arenas never get close).
            #[inline]
            pub fn from_index(n: usize) -> Self {
                Self(u32::try_from(n).expect("arena index exceeds u32"))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

arena_id! {
    /// Handle into the request arena.
    pub struct RequestId, "r";
}

arena_id! {
    /// Handle into the vehicle arena.
    pub struct VehicleId, "v";
}

arena_id! {
    /// Index of a road-network node (row/column of the travel-time matrix).
    /// Input files carry 1-based node numbers; loaders convert to 0-based.
    pub struct NodeId, "n";
}
