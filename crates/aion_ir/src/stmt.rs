//! Behavioral statements for process bodies.
//!
//! [`Statement`] represents language-independent behavioral code inside
//! processes (VHDL processes, Verilog always blocks).

use crate::expr::Expr;
use crate::signal::SignalRef;
use aion_source::Span;
use serde::{Deserialize, Serialize};

/// The kind of assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssertionKind {
    /// An `assert` statement — aborts on failure.
    Assert,
    /// An `assume` statement — constrains formal verification.
    Assume,
    /// A `cover` statement — marks a reachability goal.
    Cover,
}

/// A case arm in a case/switch statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseArm {
    /// The pattern expressions to match against.
    pub patterns: Vec<Expr>,
    /// The body to execute when matched.
    pub body: Statement,
    /// Source location.
    pub span: Span,
}

/// A behavioral statement in the IR.
///
/// Statements appear inside [`Process`](crate::process::Process) bodies
/// and represent the behavioral description of hardware. During synthesis,
/// these are lowered into combinational cells and flip-flops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// A signal assignment (`target <= value` / `assign target = value`).
    Assign {
        /// The target signal or signal slice.
        target: SignalRef,
        /// The value expression.
        value: Expr,
        /// Source location.
        span: Span,
    },
    /// An if-else statement.
    If {
        /// The condition expression.
        condition: Expr,
        /// The body when condition is true.
        then_body: Box<Statement>,
        /// The optional body when condition is false.
        else_body: Option<Box<Statement>>,
        /// Source location.
        span: Span,
    },
    /// A case/switch statement.
    Case {
        /// The subject expression being matched.
        subject: Expr,
        /// The match arms.
        arms: Vec<CaseArm>,
        /// The default arm, if any.
        default: Option<Box<Statement>>,
        /// Source location.
        span: Span,
    },
    /// A block of sequential statements.
    Block {
        /// The statements in execution order.
        stmts: Vec<Statement>,
        /// Source location.
        span: Span,
    },
    /// A wait statement (simulation only, not synthesizable).
    Wait {
        /// The optional duration expression.
        duration: Option<Expr>,
        /// Source location.
        span: Span,
    },
    /// An assertion statement.
    Assertion {
        /// The kind of assertion.
        kind: AssertionKind,
        /// The condition to check.
        condition: Expr,
        /// An optional message string.
        message: Option<String>,
        /// Source location.
        span: Span,
    },
    /// A display/report statement (`$display` / `report`).
    Display {
        /// The format string.
        format: String,
        /// The format arguments.
        args: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// A simulation finish statement (`$finish` / `std.env.stop`).
    Finish {
        /// Source location.
        span: Span,
    },
    /// A time delay statement (`#5`, `wait for 10 ns`).
    ///
    /// Suspends process execution for `duration_fs` femtoseconds, then
    /// resumes with `body`. Used by initial blocks and testbenches.
    Delay {
        /// Delay duration in femtoseconds (pre-evaluated at elaboration time).
        duration_fs: u64,
        /// The statement to execute after the delay elapses.
        body: Box<Statement>,
        /// Source location.
        span: Span,
    },
    /// An infinite loop (`forever`) wrapping a body statement.
    ///
    /// Typically contains a delay to generate periodic signals (e.g. clocks).
    /// A forever loop without any delay inside is a simulation error.
    Forever {
        /// The loop body (usually contains a delay).
        body: Box<Statement>,
        /// Source location.
        span: Span,
    },
    /// A no-operation (placeholder for empty branches).
    Nop,
}
