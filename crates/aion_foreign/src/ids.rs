//! Opaque ID newtypes for the foreign-interface stage's own IR arena.
//!
//! These mirror [`aion_ir::ids`]'s `define_id!` shape but address a distinct
//! post-schedule tree (see [`crate::ir`]), not the pre-schedule behavioral
//! IR that `aion_ir` itself models.

use aion_ir::arena::ArenaId;
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
    /// Opaque ID for a module in the foreign-interface netlist.
    ModuleId
);

define_id!(
    /// Opaque ID for a `Var` within a module's topscope.
    VarId
);

define_id!(
    /// Opaque ID for a scheduled `CFunc` within a module's topscope.
    CFuncId
);

define_id!(
    /// Opaque ID for an interned `SenTree`.
    SenTreeId
);

define_id!(
    /// Opaque ID for a nested foreign sub-module instance.
    ForeignInstanceId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let id = VarId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
    }

    #[test]
    fn id_equality() {
        let a = CFuncId::from_raw(3);
        let b = CFuncId::from_raw(3);
        let c = CFuncId::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_hash_in_set() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ForeignInstanceId::from_raw(1));
        set.insert(ForeignInstanceId::from_raw(2));
        set.insert(ForeignInstanceId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = SenTreeId::from_raw(12);
        let json = serde_json::to_string(&id).unwrap();
        let restored: SenTreeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
