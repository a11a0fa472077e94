//! E104: Multiple drivers — wire signal driven by more than one source.

use aion_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Severity};
use aion_ir::{Design, Module, SignalKind};

use crate::helpers::count_drivers;
use crate::LintRule;

/// Detects wire signals that are driven by multiple concurrent sources.
///
/// In synthesis, a wire with multiple drivers creates a short circuit.
/// Only `Wire` signals are checked; `Reg` signals can be assigned
/// in different processes under certain conditions.
pub struct MultipleDrivers;

impl LintRule for MultipleDrivers {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 104)
    }

    fn name(&self) -> &str {
        "multiple-drivers"
    }

    fn description(&self) -> &str {
        "wire signal driven by more than one concurrent source"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check_module(&self, module: &Module, _design: &Design, sink: &DiagnosticSink) {
        for (sig_id, signal) in module.signals.iter() {
            if signal.kind != SignalKind::Wire {
                continue;
            }

            let driver_count = count_drivers(module, sig_id);
            if driver_count > 1 {
                sink.emit(
                    Diagnostic::error(
                        self.code(),
                        format!("signal has {} concurrent drivers", driver_count),
                        signal.span,
                    )
                    .with_label(Label::primary(signal.span, "multiple drivers on this wire"))
                    .with_help("ensure each wire has exactly one driver"),
                );
            }
        }
    }
}
