//! Foreign-interface emitter stage.
//!
//! For every module marked as a foreign-interface boundary (or every module,
//! if [`ForeignConfig::gen_foreign_interface`] forces it), this stage:
//!
//! 1. Walks the module's post-schedule IR to partition every eval entry
//!    point's reads and writes between primary I/O and internal signals, and
//!    derives the inter-eval dependency graph ([`ref_collector`]).
//! 2. Writes a wrapper module (`foreign_<name>.v`) whose embedded
//!    `// verilator foreign_*` annotation comments form the boundary
//!    protocol the outer simulator's scheduler consumes ([`wrapper_emitter`]).
//! 3. If tracing is enabled, synthesizes `_foreign<name>` stub entry points
//!    for waveform-activity tracking ([`ref_collector::RefCollector::add_entry_points`]).
//!
//! Independently, for *every* module in the netlist (a module can instantiate
//! a foreign sub-module without being one itself), [`eval_unpacker`] rewrites
//! every `ForeignEval` node into the ordinary IR sequence that realizes the
//! cross-boundary call.
//!
//! # Glossary
//!
//! - **Eval / eval entry point.** A scheduler-addressable function
//!   representing one activation of one scheduled region in the module.
//! - **Post / NBA (non-blocking assignment).** A write whose effect is
//!   visible only after the current cycle's settle phase, as opposed to an
//!   ordinary blocking assignment.
//! - **Settle phase.** A fixed-point iteration phase run until no further
//!   signal changes occur, used for combinational loops and zero-delay
//!   feedback.
//! - **Primary I/O.** A module's externally visible ports, as opposed to
//!   internal nets.
//! - **Shadow port.** A synthesized internal `Var` standing in for a foreign
//!   sub-module's port on the outer side of the boundary.
//! - **Foreign instance.** A nested sub-module compiled and executed by a
//!   separate, co-simulated process or library.

#![warn(missing_docs)]

pub mod config;
pub mod errors;
pub mod eval_unpacker;
pub mod ids;
pub mod ir;
pub mod ref_collector;
pub mod wrapper_emitter;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use aion_common::Interner;
use aion_diagnostics::DiagnosticSink;

pub use config::ForeignConfig;
pub use errors::FieError;

use ids::ModuleId;
use ir::Netlist;
use ref_collector::RefCollector;

/// Runs the foreign-interface stage over the whole netlist.
///
/// For each foreign-interface-source module, collects references, writes
/// the wrapper file under `make_dir`, and (if tracing) synthesizes entry
/// point stubs. Then, for every module, rewrites `ForeignEval` nodes in
/// place. `sink` receives any non-fatal diagnostics a future base-emitter
/// integration might raise; this stage currently raises none itself — every
/// failure mode it detects is structural and returned as a [`FieError`].
pub fn emit_foreign_interfaces(
    netlist: &mut Netlist,
    config: &ForeignConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
    make_dir: &Path,
) -> Result<(), FieError> {
    let _ = sink;

    let module_ids: Vec<ModuleId> = netlist.modules.iter().map(|(id, _)| id).collect();

    for id in &module_ids {
        let is_source = {
            let module = netlist.modules.get(*id);
            config.gen_foreign_interface || module.is_foreign_module()
        };
        if !is_source {
            continue;
        }

        let collector = {
            let module = netlist.modules.get(*id);
            log::debug!(
                "collecting foreign references for module `{}`",
                interner.resolve(module.name)
            );
            RefCollector::new(module)?
        };

        let wrapper_path = {
            let module = netlist.modules.get(*id);
            let foreign_name = module.foreign_name.unwrap_or(module.name);
            make_dir.join(format!("foreign_{}.v", interner.resolve(foreign_name)))
        };
        let file = File::create(&wrapper_path)?;
        let mut writer = BufWriter::new(file);
        {
            let module = netlist.modules.get(*id);
            wrapper_emitter::emit_wrapper(module, &collector, config, interner, &mut writer)?;
        }

        if config.trace {
            let module = netlist.modules.get_mut(*id);
            let stubs = collector.add_entry_points(&module.topscope, interner);
            log::debug!(
                "synthesizing {} trace entry-point stub(s) for module `{}`",
                stubs.len(),
                interner.resolve(module.name)
            );
            for stub in stubs {
                module.topscope.cfuncs.alloc(stub);
            }
        }
    }

    for id in &module_ids {
        let module = netlist.modules.get_mut(*id);
        let mut unpacker = eval_unpacker::EvalUnpacker::new();
        unpacker.unpack_module(module, interner)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Module, ModuleKeyword, TopScope};
    use aion_source::Span;

    #[test]
    fn empty_netlist_is_a_no_op() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut netlist = Netlist::new();
        let config = ForeignConfig::default();
        let dir = std::env::temp_dir();
        let result = emit_foreign_interfaces(&mut netlist, &config, &interner, &sink, &dir);
        assert!(result.is_ok());
        assert!(!sink.has_errors());
    }

    #[test]
    fn non_foreign_module_without_gen_flag_is_skipped() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut netlist = Netlist::new();
        netlist.modules.alloc(Module {
            name: interner.get_or_intern("plain"),
            kwd: ModuleKeyword::Module,
            foreign_name: None,
            topscope: TopScope::default(),
            span: Span::DUMMY,
        });
        let config = ForeignConfig::default();
        let dir = std::env::temp_dir();
        let result = emit_foreign_interfaces(&mut netlist, &config, &interner, &sink, &dir);
        assert!(result.is_ok());
    }

    #[test]
    fn foreign_module_writes_wrapper_file() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut netlist = Netlist::new();
        netlist.modules.alloc(Module {
            name: interner.get_or_intern("sub"),
            kwd: ModuleKeyword::Module,
            foreign_name: Some(interner.get_or_intern("sub")),
            topscope: TopScope::default(),
            span: Span::DUMMY,
        });
        let config = ForeignConfig::default();
        let dir = std::env::temp_dir().join(format!(
            "aion_foreign_test_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        emit_foreign_interfaces(&mut netlist, &config, &interner, &sink, &dir).unwrap();
        let contents = std::fs::read_to_string(dir.join("foreign_sub.v")).unwrap();
        assert!(contents.contains("module foreign_sub ("));
        std::fs::remove_dir_all(&dir).ok();
    }
}
