//! Configuration bits consumed read-only by the foreign-interface stage.

use serde::{Deserialize, Serialize};

/// Global configuration read by the foreign-interface stage.
///
/// Injected explicitly at the stage entry point rather than read from
/// ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForeignConfig {
    /// Whether tracing is enabled for this compilation.
    ///
    /// Affects the `_foreign` annotation prefix (`emit_foreign_eval`/
    /// `emit_foreign_depend`) and gates [`crate::ref_collector::RefCollector::add_entry_points`].
    pub trace: bool,
    /// Forces wrapper emission for every module, not only modules already
    /// marked as a foreign sub-module.
    pub gen_foreign_interface: bool,
}
