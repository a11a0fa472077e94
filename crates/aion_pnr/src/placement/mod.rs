//! Placement engine for the PnR pipeline.
//!
//! Assigns each cell in the netlist to a physical site on the FPGA device.
//! Uses random initial placement followed by simulated annealing refinement
//! to minimize wire length and timing-critical path delays.

mod anneal;
mod cost;
mod random;

use crate::data::PnrNetlist;
use aion_arch::Architecture;
use aion_diagnostics::DiagnosticSink;

pub use cost::PlacementCost;

/// Performs placement on the netlist, assigning each cell to a device site.
///
/// First generates a random initial placement using resource counts from the
/// architecture, then refines it with simulated annealing to minimize
/// estimated wire length and timing cost.
pub fn place(netlist: &mut PnrNetlist, arch: &dyn Architecture, sink: &DiagnosticSink) {
    // Phase 1: Random initial placement using synthetic site IDs
    random::random_placement(netlist, arch, sink);

    // Phase 2: Simulated annealing refinement
    anneal::simulated_annealing(netlist, arch, sink);
}
