//! Opaque ID newtypes for netlist entities.
//!
//! Each ID is a thin `u32` wrapper created by
//! [`Arena::alloc`](crate::arena::Arena::alloc) and used for O(1) lookup.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque ID for a module within a design.
    ModuleId
);

define_id!(
    /// Opaque ID for a wire within a module.
    WireId
);

define_id!(
    /// Opaque ID for a cell within a module.
    CellId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn roundtrip() {
        assert_eq!(WireId::from_raw(9).as_raw(), 9);
    }

    #[test]
    fn equality_and_hash() {
        let mut set = HashSet::new();
        set.insert(CellId::from_raw(1));
        set.insert(CellId::from_raw(2));
        set.insert(CellId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn ordering_follows_raw_index() {
        assert!(WireId::from_raw(1) < WireId::from_raw(4));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ModuleId::from_raw(11);
        let json = serde_json::to_string(&id).unwrap();
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
