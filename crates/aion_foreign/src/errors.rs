//! Diagnostic codes for non-fatal conditions, plus the structural-violation
//! error type for conditions the stage cannot recover from.
//!
//! Error codes `E400`-`E401` cover non-fatal conditions the stage's IR-edit
//! output can still carry forward (mirrors `aion_elaborate::errors`'s
//! `E2xx`/`W2xx` split). [`FieError`] covers structural violations in the IR
//! the stage was handed: these are not user-correctable HDL defects, so they
//! abort the stage rather than flow through a
//! [`DiagnosticSink`](aion_diagnostics::DiagnosticSink).

use aion_diagnostics::{Category, Diagnostic, DiagnosticCode};
use aion_source::Span;

/// An IR node kind the base emitter does not recognize.
pub const E400: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 400,
};

/// Creates a non-fatal diagnostic for an unrecognized IR node kind reached
/// during text emission. Per the error-handling design, this does not abort
/// the stage: a placeholder is written to the output and the diagnostic is
/// accumulated for the caller to report.
pub fn error_unknown_node_kind(type_name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E400, format!("unknown IR node kind: {type_name}"), span)
        .with_note("this is a base-emitter limitation, not specific to the foreign interface")
}

/// Fatal structural violations in the IR the stage was handed.
///
/// Every variant is a structural IR violation the stage cannot proceed past.
/// The stage does not retry or recover from any of these; the caller's
/// standard fatal-error path takes over.
#[derive(Debug, thiserror::Error)]
pub enum FieError {
    /// A second `TopScope` was encountered; the IR model allows exactly one.
    #[error("duplicate topscope encountered in module `{module}`")]
    DuplicateTopScope {
        /// The module whose IR carried the duplicate topscope.
        module: String,
    },

    /// A conditional `ForeignEval` was found outside any eval entry point.
    #[error("conditional foreign eval `{eval_name}` encountered outside any eval")]
    ConditionalEvalOutsideEval {
        /// The name of the offending `ForeignEval`.
        eval_name: String,
    },

    /// A memoized shadow port was requested with a direction inconsistent
    /// with a prior use of the same `(instance, port)` key.
    #[error(
        "inconsistent direction for shadow port `{port}` on instance `{instance}`: \
         previously used as {prev_direction}, now requested as {new_direction}"
    )]
    ShadowPortDirectionMismatch {
        /// The foreign instance the port belongs to.
        instance: String,
        /// The port name.
        port: String,
        /// `"lvalue"` or `"rvalue"`, describing the prior use.
        prev_direction: &'static str,
        /// `"lvalue"` or `"rvalue"`, describing the new, conflicting use.
        new_direction: &'static str,
    },

    /// Opening or writing the wrapper file failed. Surfaced here rather
    /// than swallowed since this stage is the one that opens the file.
    #[error("failed to write foreign-interface wrapper: {0}")]
    Io(#[from] std::io::Error),
}
