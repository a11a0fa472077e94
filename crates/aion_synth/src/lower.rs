//! Behavioral lowering: converts processes and assignments to cells.
//!
//! For each [`Process`] in a module, based on its [`ProcessKind`]:
//! - **Sequential** (`always_ff`): extracts clock/reset, creates DFF cells
//! - **Combinational** (`always_comb`): creates MUX chains for if/case
//! - **Latched** (`always_latch`): creates latch cells
//! - **Initial**: skipped (simulation only, not synthesizable)
//!
//! Concurrent assignments are lowered by evaluating the expression and
//! wiring the output to the target signal.

use crate::lower_expr::lower_expr;
use crate::netlist::Netlist;
use aion_common::LogicVec;
use aion_diagnostics::{Category, DiagnosticCode, DiagnosticSink};
use aion_ir::{
    CaseArm, CellKind, EdgeSensitivity, Expr, Module, Process, ProcessKind, Sensitivity, SignalId,
    SignalKind, SignalRef, Statement, Type,
};

/// Lowers all processes and assignments in a module into the netlist.
///
/// After this pass, the netlist contains only cells (no behavioral code).
pub(crate) fn lower_module(module: &Module, netlist: &mut Netlist, sink: &DiagnosticSink) {
    // Lower concurrent assignments first
    let assignments: Vec<_> = netlist.assignments.drain(..).collect();
    for assign in &assignments {
        let value = lower_expr(&assign.value, netlist);
        wire_signal_ref(&assign.target, &value, netlist);
    }

    // Lower each process
    for (_id, process) in module.processes.iter() {
        lower_process(process, netlist, sink);
    }
}

/// Lowers a single process into cells.
fn lower_process(process: &Process, netlist: &mut Netlist, sink: &DiagnosticSink) {
    match process.kind {
        ProcessKind::Sequential => lower_sequential(process, netlist, sink),
        ProcessKind::Combinational => lower_combinational(process, netlist, sink),
        ProcessKind::Latched => lower_latched(process, netlist),
        ProcessKind::Initial => {
            // Initial blocks are simulation-only — skip with a diagnostic
            sink.emit(aion_diagnostics::Diagnostic::warning(
                DiagnosticCode::new(Category::Vendor, 1),
                "initial block skipped during synthesis (simulation only)",
                process.span,
            ));
        }
    }
}

/// Lowers a sequential process (always_ff) into DFF cells.
fn lower_sequential(process: &Process, netlist: &mut Netlist, sink: &DiagnosticSink) {
    // Extract clock and reset from sensitivity list
    let (clock, reset) = extract_clock_reset(&process.sensitivity);

    // Find all signals assigned in the body
    let assigned = collect_assigned_signals(&process.body);
    if assigned.is_empty() {
        return;
    }

    // For each assigned signal, create a DFF
    for &sig_id in &assigned {
        let width = netlist.signal_width(sig_id);
        let has_reset = reset.is_some();

        // Lower the body to find the value driven to this signal
        let d_value = lower_stmt_for_signal(&process.body, sig_id, netlist);

        let d_ref = match d_value {
            Some(v) => v,
            None => {
                // Signal assigned but no path found — feedback (hold value)
                SignalRef::Signal(sig_id)
            }
        };

        // Create DFF
        let out_ty = if width == 1 {
            netlist.types.intern(Type::Bit)
        } else {
            netlist.types.intern(Type::BitVec {
                width,
                signed: false,
            })
        };
        let q_out = netlist.add_signal("dff_q", out_ty, SignalKind::Reg);

        let mut connections = vec![
            netlist.input_conn("D", d_ref),
            netlist.output_conn("Q", SignalRef::Signal(q_out)),
        ];

        // Add clock connection
        if let Some(ref clk) = clock {
            connections.push(netlist.input_conn("CLK", SignalRef::Signal(clk.signal)));
        }

        // Add reset connection
        if let Some(ref rst) = reset {
            connections.push(netlist.input_conn("RST", SignalRef::Signal(rst.signal)));
            // Find reset value — look for the pattern: if (reset) target = value
            if let Some(rst_val) = find_reset_value(&process.body, sig_id, rst.signal) {
                let rst_ref = lower_expr(&rst_val, netlist);
                connections.push(netlist.input_conn("RST_VAL", rst_ref));
            }
        }

        netlist.add_cell(
            "dff",
            CellKind::Dff {
                width,
                has_reset,
                has_enable: false,
            },
            connections,
        );

        // Wire DFF output to the original signal
        wire_signal_ref(
            &SignalRef::Signal(sig_id),
            &SignalRef::Signal(q_out),
            netlist,
        );

        let _ = sink; // Used above for warnings
    }
}

/// Lowers a combinational process (always_comb) into MUX chains.
fn lower_combinational(process: &Process, netlist: &mut Netlist, sink: &DiagnosticSink) {
    let assigned = collect_assigned_signals(&process.body);
    for &sig_id in &assigned {
        let value = lower_stmt_for_signal(&process.body, sig_id, netlist);
        match value {
            Some(v) => {
                wire_signal_ref(&SignalRef::Signal(sig_id), &v, netlist);
            }
            None => {
                // Incomplete assignment — signal not assigned on all paths
                // This implies a latch
                sink.emit(aion_diagnostics::Diagnostic::warning(
                    DiagnosticCode::new(Category::Vendor, 2),
                    format!(
                        "incomplete assignment in combinational process infers latch for signal {}",
                        sig_id.as_raw()
                    ),
                    process.span,
                ));
                let width = netlist.signal_width(sig_id);
                netlist.add_cell(
                    "inferred_latch",
                    CellKind::Latch { width },
                    vec![
                        netlist.input_conn("D", SignalRef::Signal(sig_id)),
                        netlist.output_conn("Q", SignalRef::Signal(sig_id)),
                    ],
                );
            }
        }
    }
}

/// Lowers a latched process (always_latch) into latch cells.
fn lower_latched(process: &Process, netlist: &mut Netlist) {
    let assigned = collect_assigned_signals(&process.body);
    for &sig_id in &assigned {
        let width = netlist.signal_width(sig_id);
        let value = lower_stmt_for_signal(&process.body, sig_id, netlist);
        let d_ref = value.unwrap_or(SignalRef::Signal(sig_id));
        netlist.add_cell(
            "latch",
            CellKind::Latch { width },
            vec![
                netlist.input_conn("D", d_ref),
                netlist.output_conn("Q", SignalRef::Signal(sig_id)),
            ],
        );
    }
}

/// Lowers a statement tree for a specific target signal, returning the value
/// driven to that signal as a `SignalRef` (with MUX cells for if/case).
fn lower_stmt_for_signal(
    stmt: &Statement,
    target: SignalId,
    netlist: &mut Netlist,
) -> Option<SignalRef> {
    match stmt {
        Statement::Assign {
            target: ref tgt,
            value,
            ..
        } => {
            if signal_ref_contains(tgt, target) {
                Some(lower_expr(value, netlist))
            } else {
                None
            }
        }

        Statement::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            let then_val = lower_stmt_for_signal(then_body, target, netlist);
            let else_val = else_body
                .as_ref()
                .and_then(|e| lower_stmt_for_signal(e, target, netlist));

            match (then_val, else_val) {
                (Some(t), Some(e)) => {
                    // Both branches assign — create MUX
                    let cond = lower_expr(condition, netlist);
                    let width = signal_ref_width(&t, netlist);
                    let out_ty = if width == 1 {
                        netlist.types.intern(Type::Bit)
                    } else {
                        netlist.types.intern(Type::BitVec {
                            width,
                            signed: false,
                        })
                    };
                    let out = netlist.add_signal("if_mux", out_ty, SignalKind::Wire);
                    netlist.add_cell(
                        "if_mux",
                        CellKind::Mux {
                            width,
                            select_width: 1,
                        },
                        vec![
                            netlist.input_conn("S", cond),
                            netlist.input_conn("A", e),
                            netlist.input_conn("B", t),
                            netlist.output_conn("Y", SignalRef::Signal(out)),
                        ],
                    );
                    Some(SignalRef::Signal(out))
                }
                (Some(t), None) => Some(t),
                (None, Some(e)) => Some(e),
                (None, None) => None,
            }
        }

        Statement::Case {
            subject,
            arms,
            default,
            ..
        } => lower_case_for_signal(subject, arms, default.as_deref(), target, netlist),

        Statement::Block { stmts, .. } => {
            // Last assignment wins (sequential semantics in synthesis)
            let mut result = None;
            for s in stmts {
                if let Some(v) = lower_stmt_for_signal(s, target, netlist) {
                    result = Some(v);
                }
            }
            result
        }

        // Non-synthesizable statements are ignored
        Statement::Wait { .. }
        | Statement::Assertion { .. }
        | Statement::Display { .. }
        | Statement::Finish { .. }
        | Statement::Delay { .. }
        | Statement::Forever { .. }
        | Statement::Nop => None,
    }
}

/// Lowers a case statement for a specific target signal into a priority MUX chain.
fn lower_case_for_signal(
    subject: &Expr,
    arms: &[CaseArm],
    default: Option<&Statement>,
    target: SignalId,
    netlist: &mut Netlist,
) -> Option<SignalRef> {
    let subj_ref = lower_expr(subject, netlist);

    // Start with default value (if any)
    let mut current = default.and_then(|d| lower_stmt_for_signal(d, target, netlist));

    // Build priority MUX chain from last arm to first
    for arm in arms.iter().rev() {
        let arm_val = lower_stmt_for_signal(&arm.body, target, netlist);
        let arm_val = match arm_val {
            Some(v) => v,
            None => continue,
        };

        // Create equality comparison for each pattern
        for pattern in &arm.patterns {
            let pat_ref = lower_expr(pattern, netlist);
            let bit_ty = netlist.types.intern(Type::Bit);
            let eq_out = netlist.add_signal("case_eq", bit_ty, SignalKind::Wire);
            let cmp_width = signal_ref_width(&subj_ref, netlist);
            netlist.add_cell(
                "case_eq",
                CellKind::Eq { width: cmp_width },
                vec![
                    netlist.input_conn("A", subj_ref.clone()),
                    netlist.input_conn("B", pat_ref),
                    netlist.output_conn("Y", SignalRef::Signal(eq_out)),
                ],
            );

            let width = signal_ref_width(&arm_val, netlist);
            let out_ty = if width == 1 {
                netlist.types.intern(Type::Bit)
            } else {
                netlist.types.intern(Type::BitVec {
                    width,
                    signed: false,
                })
            };

            // MUX: if match, use arm value, else use current
            let fallback = current
                .clone()
                .unwrap_or(SignalRef::Const(LogicVec::all_zero(width)));
            let out = netlist.add_signal("case_mux", out_ty, SignalKind::Wire);
            netlist.add_cell(
                "case_mux",
                CellKind::Mux {
                    width,
                    select_width: 1,
                },
                vec![
                    netlist.input_conn("S", SignalRef::Signal(eq_out)),
                    netlist.input_conn("A", fallback),
                    netlist.input_conn("B", arm_val.clone()),
                    netlist.output_conn("Y", SignalRef::Signal(out)),
                ],
            );
            current = Some(SignalRef::Signal(out));
        }
    }

    current
}

/// Extracts clock and reset signals from a sensitivity list.
fn extract_clock_reset(
    sensitivity: &Sensitivity,
) -> (Option<EdgeSensitivity>, Option<EdgeSensitivity>) {
    match sensitivity {
        Sensitivity::EdgeList(edges) => {
            // Convention: first edge is clock, second (if any) is reset
            let clock = edges.first().cloned();
            let reset = edges.get(1).cloned();
            (clock, reset)
        }
        _ => (None, None),
    }
}

/// Finds the reset value for a signal in a sequential process body.
///
/// Looks for the pattern: `if (reset) { target = value; }`
fn find_reset_value(stmt: &Statement, target: SignalId, reset_signal: SignalId) -> Option<Expr> {
    match stmt {
        Statement::If {
            condition,
            then_body,
            ..
        } => {
            // Check if condition references the reset signal
            if expr_references_signal(condition, reset_signal) {
                // Look for assignment to target in then branch
                if let Some(val) = find_assign_value(then_body, target) {
                    return Some(val);
                }
            }
            // Also check nested ifs in then/else
            None
        }
        Statement::Block { stmts, .. } => {
            for s in stmts {
                if let Some(v) = find_reset_value(s, target, reset_signal) {
                    return Some(v);
                }
            }
            None
        }
        _ => None,
    }
}

/// Finds the value assigned to a target signal in a statement.
fn find_assign_value(stmt: &Statement, target: SignalId) -> Option<Expr> {
    match stmt {
        Statement::Assign {
            target: ref tgt,
            value,
            ..
        } => {
            if signal_ref_contains(tgt, target) {
                Some(value.clone())
            } else {
                None
            }
        }
        Statement::Block { stmts, .. } => {
            for s in stmts {
                if let Some(v) = find_assign_value(s, target) {
                    return Some(v);
                }
            }
            None
        }
        Statement::If { then_body, .. } => find_assign_value(then_body, target),
        _ => None,
    }
}

/// Checks if an expression references a specific signal.
fn expr_references_signal(expr: &Expr, signal: SignalId) -> bool {
    match expr {
        Expr::Signal(SignalRef::Signal(id)) => *id == signal,
        Expr::Signal(SignalRef::Slice { signal: id, .. }) => *id == signal,
        Expr::Unary { operand, .. } => expr_references_signal(operand, signal),
        Expr::Binary { lhs, rhs, .. } => {
            expr_references_signal(lhs, signal) || expr_references_signal(rhs, signal)
        }
        Expr::Ternary {
            condition,
            true_val,
            false_val,
            ..
        } => {
            expr_references_signal(condition, signal)
                || expr_references_signal(true_val, signal)
                || expr_references_signal(false_val, signal)
        }
        _ => false,
    }
}

/// Collects all signals assigned in a statement tree.
fn collect_assigned_signals(stmt: &Statement) -> Vec<SignalId> {
    let mut signals = Vec::new();
    collect_assigned_signals_inner(stmt, &mut signals);
    signals.sort_by_key(|s| s.as_raw());
    signals.dedup();
    signals
}

fn collect_assigned_signals_inner(stmt: &Statement, signals: &mut Vec<SignalId>) {
    match stmt {
        Statement::Assign { target, .. } => {
            collect_signal_ref_ids(target, signals);
        }
        Statement::If {
            then_body,
            else_body,
            ..
        } => {
            collect_assigned_signals_inner(then_body, signals);
            if let Some(e) = else_body {
                collect_assigned_signals_inner(e, signals);
            }
        }
        Statement::Case { arms, default, .. } => {
            for arm in arms {
                collect_assigned_signals_inner(&arm.body, signals);
            }
            if let Some(d) = default {
                collect_assigned_signals_inner(d, signals);
            }
        }
        Statement::Block { stmts, .. } => {
            for s in stmts {
                collect_assigned_signals_inner(s, signals);
            }
        }
        Statement::Delay { body, .. } | Statement::Forever { body, .. } => {
            collect_assigned_signals_inner(body, signals);
        }
        _ => {}
    }
}

fn collect_signal_ref_ids(sr: &SignalRef, signals: &mut Vec<SignalId>) {
    match sr {
        SignalRef::Signal(id) => signals.push(*id),
        SignalRef::Slice { signal, .. } => signals.push(*signal),
        SignalRef::Concat(refs) => {
            for r in refs {
                collect_signal_ref_ids(r, signals);
            }
        }
        SignalRef::Const(_) => {}
    }
}

/// Checks if a signal ref contains a reference to a specific signal ID.
fn signal_ref_contains(sr: &SignalRef, target: SignalId) -> bool {
    match sr {
        SignalRef::Signal(id) => *id == target,
        SignalRef::Slice { signal, .. } => *signal == target,
        SignalRef::Concat(refs) => refs.iter().any(|r| signal_ref_contains(r, target)),
        SignalRef::Const(_) => false,
    }
}

/// Wires one signal ref to another by creating a buffer cell.
/// Wires the output of a lowered expression to a target signal.
///
/// Finds the cell that drives the source signal and redirects its output
/// to the target. If no driving cell exists (e.g., signal-to-signal passthrough),
/// creates a buffer cell.
fn wire_signal_ref(target: &SignalRef, source: &SignalRef, netlist: &mut Netlist) {
    let target_id = match target {
        SignalRef::Signal(id) => *id,
        SignalRef::Slice { signal, .. } => *signal,
        SignalRef::Concat(_) | SignalRef::Const(_) => return,
    };

    let source_id = match source {
        SignalRef::Signal(id) => *id,
        _ => {
            // Complex source — no redirect possible
            return;
        }
    };

    // If source == target, nothing to do
    if source_id == target_id {
        return;
    }

    // Find the cell that drives source_id and redirect its output to target
    let mut redirected = false;
    for (_cell_id, cell) in netlist.cells.iter_mut() {
        for conn in &mut cell.connections {
            if conn.direction == aion_ir::PortDirection::Output
                && conn.signal == SignalRef::Signal(source_id)
            {
                conn.signal = target.clone();
                redirected = true;
            }
        }
    }

    if !redirected {
        // No driving cell found — source is a primary input or port.
        // Create a buffer (1-bit NOT NOT or just use Const/identity).
        // Simplest: create a Slice cell that extracts the full width.
        let width = netlist.signal_width(source_id);
        netlist.add_cell(
            "buf",
            CellKind::Slice { offset: 0, width },
            vec![
                netlist.input_conn("A", SignalRef::Signal(source_id)),
                netlist.output_conn("Y", target.clone()),
            ],
        );
    }
}

/// Gets the bit width of a signal ref from the netlist.
fn signal_ref_width(sr: &SignalRef, netlist: &Netlist) -> u32 {
    match sr {
        SignalRef::Signal(id) => netlist.signal_width(*id),
        SignalRef::Slice { high, low, .. } => high - low + 1,
        SignalRef::Const(lv) => lv.width(),
        SignalRef::Concat(_) => {
            // Sum of all parts — approximate as 1 for now
            1
        }
    }
}
