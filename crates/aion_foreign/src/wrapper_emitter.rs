//! Emits the textual wrapper module for a foreign-interface boundary.
//!
//! Output structure, ordering, and the `foreign_read`/`foreign_read_post`
//! split are a stable bit-level protocol with the outer simulator: do not
//! reorder or reword any of the `// verilator ...` annotation lines.

use std::io::{self, Write};

use aion_common::Interner;

use crate::config::ForeignConfig;
use crate::ir::Module;
use crate::ref_collector::{BlockType, RefCollector};

/// Writes the wrapper module for `module` to `out`, using `collector`'s
/// already-computed port and eval information.
pub fn emit_wrapper(
    module: &Module,
    collector: &RefCollector,
    config: &ForeignConfig,
    interner: &Interner,
    out: &mut impl Write,
) -> io::Result<()> {
    let topscope = &module.topscope;
    let foreign_name = module.foreign_name.unwrap_or(module.name);

    writeln!(out, "// verilator tracing_off")?;
    writeln!(out, "// verilator lint_off UNOPTFLAT")?;

    writeln!(
        out,
        "{} foreign_{} (",
        module.kwd.as_str(),
        interner.resolve(foreign_name)
    )?;
    for (i, &port) in collector.ports.iter().enumerate() {
        let var = topscope.vars.get(port);
        let sep = if i + 1 < collector.ports.len() { "," } else { "" };
        writeln!(
            out,
            "  {} {} {}{}",
            var.verilog_kwd,
            var.dtype,
            interner.resolve(var.pretty_name),
            sep
        )?;
    }
    writeln!(out, ");")?;

    writeln!(out, "// verilator inline_module")?;
    writeln!(
        out,
        "// verilator foreign_interface {}",
        interner.resolve(foreign_name)
    )?;

    for port in collector.default_write_ports(topscope) {
        let var = topscope.vars.get(port);
        writeln!(
            out,
            "// verilator foreign_write {}",
            interner.resolve(var.pretty_name)
        )?;
    }

    for eval in &collector.evals {
        emit_sensitivity_block(eval, collector, topscope, config, interner, out)?;
    }

    writeln!(out, "end{}", module.kwd.as_str())?;
    Ok(())
}

fn emit_sensitivity_block(
    eval: &crate::ref_collector::EvalInfo,
    collector: &RefCollector,
    topscope: &crate::ir::TopScope,
    config: &ForeignConfig,
    interner: &Interner,
    out: &mut impl Write,
) -> io::Result<()> {
    match eval.block_type {
        BlockType::Initial => writeln!(out, "initial begin")?,
        BlockType::Final => writeln!(out, "final begin")?,
        BlockType::Always => {
            let has_settle = eval
                .sensesp
                .map(|id| topscope.sentrees.get(id).has_settle)
                .unwrap_or(false);
            if has_settle {
                writeln!(out, "always @(foreign_settle) begin")?;
            } else {
                let sentree = eval
                    .sensesp
                    .map(|id| topscope.sentrees.get(id).to_string())
                    .unwrap_or_default();
                writeln!(out, "always {sentree} begin")?;
            }
        }
    }

    let trace_prefix = if config.trace { "_foreign" } else { "" };

    let func_name = interner.resolve(topscope.cfuncs.get(eval.funcp).name);
    writeln!(out, "// verilator foreign_eval {trace_prefix}{func_name}")?;

    for &dep_idx in &eval.depends {
        let dep_func = interner.resolve(topscope.cfuncs.get(collector.evals[dep_idx].funcp).name);
        writeln!(out, "// verilator foreign_depend {trace_prefix}{dep_func}")?;
    }

    for &port in &eval.port_reads {
        let var = topscope.vars.get(port);
        writeln!(
            out,
            "// verilator foreign_write {}",
            interner.resolve(var.pretty_name)
        )?;
    }

    for tag in &eval.port_writes {
        let var = topscope.vars.get(tag.var);
        let name = interner.resolve(var.pretty_name);
        if tag.is_post {
            writeln!(out, "// verilator foreign_read_post {name}")?;
        } else {
            writeln!(out, "// verilator foreign_read {name}")?;
        }
    }

    writeln!(out, "end")
}
