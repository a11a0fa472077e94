//! E105: Port mismatch — cell instance connections don't match module ports.

use aion_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Severity};
use aion_ir::{CellKind, Design, Module};

use crate::helpers::{check_cell_port_match, PortMatchIssue};
use crate::LintRule;

/// Detects cell instances whose connections don't match the instantiated
/// module's port list.
///
/// This checks for extra connections (port name not in module) and
/// missing connections (module port not connected).
pub struct PortMismatch;

impl LintRule for PortMismatch {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 105)
    }

    fn name(&self) -> &str {
        "port-mismatch"
    }

    fn description(&self) -> &str {
        "cell instance connections don't match module ports"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check_module(&self, module: &Module, design: &Design, sink: &DiagnosticSink) {
        for (_cid, cell) in module.cells.iter() {
            let target_mod_id = match &cell.kind {
                CellKind::Instance { module, .. } => *module,
                _ => continue,
            };

            let target_module = design.modules.get(target_mod_id);
            let issues = check_cell_port_match(cell, target_module);

            for issue in issues {
                match issue {
                    PortMatchIssue::ExtraConnection(conn) => {
                        sink.emit(
                            Diagnostic::error(
                                self.code(),
                                "connection to non-existent port",
                                cell.span,
                            )
                            .with_label(Label::primary(
                                cell.span,
                                format!(
                                    "port '{}' does not exist on target module",
                                    conn.port_name.as_raw()
                                ),
                            )),
                        );
                    }
                    PortMatchIssue::MissingConnection(port_name) => {
                        sink.emit(
                            Diagnostic::error(self.code(), "missing port connection", cell.span)
                                .with_label(Label::primary(
                                    cell.span,
                                    format!("port '{}' is not connected", port_name.as_raw()),
                                ))
                                .with_help("connect all ports of the instantiated module"),
                        );
                    }
                }
            }
        }
    }
}
