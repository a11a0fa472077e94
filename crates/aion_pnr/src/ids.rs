//! Opaque ID newtypes for place-and-route entities.
//!
//! [`PnrCellId`], [`PnrNetId`], and [`PnrPinId`] are thin `u32` wrappers used
//! as arena indices into the PnR netlist. They are `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a cell in the PnR netlist.
    PnrCellId
);

define_id!(
    /// Opaque, copyable ID for a net in the PnR netlist.
    PnrNetId
);

define_id!(
    /// Opaque, copyable ID for a pin in the PnR netlist.
    PnrPinId
);
