//! Place and route engine for the Aion FPGA toolchain.
//!
//! This crate takes a technology-mapped [`MappedDesign`] (from `aion_synth`) and
//! assigns each cell to a physical device site (placement) then connects all
//! nets through the routing fabric (routing). The output is a fully placed and
//! routed [`PnrNetlist`] ready for bitstream generation.
//!
//! # Pipeline
//!
//! 1. **Convert** — flatten `MappedDesign` to a flat `PnrNetlist`
//! 2. **Place** — random initial placement + simulated annealing refinement
//! 3. **Route** — PathFinder negotiated congestion routing (stub in Phase 2)
//! 4. **Timing bridge** — convert to `TimingGraph` for STA feedback
//!
//! # Usage
//!
//! ```ignore
//! use aion_pnr::place_and_route;
//!
//! let netlist = place_and_route(&mapped_design, &*arch, &constraints, &interner, &sink)?;
//! assert!(netlist.is_fully_placed());
//! assert!(netlist.is_fully_routed());
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod data;
pub mod ids;
pub mod placement;
pub mod route_tree;
pub mod routing;
pub mod timing_bridge;

pub use convert::convert_to_pnr;
pub use data::{
    BramConfig, DspConfig, PllConfig, PnrCell, PnrCellType, PnrNet, PnrNetlist, PnrPin,
};
pub use ids::{PnrCellId, PnrNetId, PnrPinId};
pub use placement::PlacementCost;
pub use route_tree::{RouteNode, RouteResource, RouteTree};
pub use timing_bridge::build_timing_graph;

use aion_arch::Architecture;
use aion_common::{AionResult, Interner};
use aion_diagnostics::DiagnosticSink;
use aion_synth::MappedDesign;
use aion_timing::TimingConstraints;

/// Performs the complete place-and-route pipeline on a synthesized design.
///
/// Converts the [`MappedDesign`] to a flat netlist, places all cells using
/// simulated annealing, routes all nets, and optionally builds a timing graph
/// for static timing analysis feedback.
///
/// Returns the placed and routed [`PnrNetlist`].
pub fn place_and_route(
    mapped: &MappedDesign,
    arch: &dyn Architecture,
    _constraints: &TimingConstraints,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> AionResult<PnrNetlist> {
    // 1. Convert MappedDesign → PnrNetlist
    let mut netlist = convert_to_pnr(mapped, interner);

    // 2. Placement
    placement::place(&mut netlist, arch, sink);

    // 3. Routing
    routing::route(&mut netlist, arch, sink);

    Ok(netlist)
}
