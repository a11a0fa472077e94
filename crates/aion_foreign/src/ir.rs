//! The post-schedule IR tree consumed by the foreign-interface stage.
//!
//! This is deliberately a separate tree from [`aion_ir`]'s pre-schedule
//! behavioral IR: by the time this stage runs, elaboration and scheduling
//! have already turned processes into scheduler-addressable `CFunc`s grouped
//! under `Active` regions, which `aion_ir::module::Module` does not model.
//! Node kinds and field names follow the data model this stage was
//! specified against; navigation is by arena index rather than by
//! `nextp()`/parent back-pointers, reusing [`aion_ir::arena`].

use aion_common::Ident;
use aion_ir::arena::Arena;
use aion_source::Span;
use serde::{Deserialize, Serialize};

use crate::ids::{CFuncId, ForeignInstanceId, ModuleId, SenTreeId, VarId};

/// The Verilog keyword a module was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKeyword {
    /// `module`.
    Module,
    /// `macromodule`.
    Macromodule,
    /// `program`.
    Program,
}

impl ModuleKeyword {
    /// Returns the literal Verilog keyword text.
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKeyword::Module => "module",
            ModuleKeyword::Macromodule => "macromodule",
            ModuleKeyword::Program => "program",
        }
    }
}

/// An ordered sequence of modules, the top-level unit this stage iterates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Netlist {
    /// The modules in the netlist, in declaration order.
    pub modules: Arena<ModuleId, Module>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A module's declaration, topscope, and foreign-interface metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The module's declared name.
    pub name: Ident,
    /// The keyword this module was declared with.
    pub kwd: ModuleKeyword,
    /// The name used for this module's foreign wrapper, if it is a foreign
    /// sub-module boundary (`Some` iff `foreignModule()` would be true).
    pub foreign_name: Option<Ident>,
    /// The module's single topscope.
    pub topscope: TopScope,
    /// Source location of the module declaration.
    pub span: Span,
}

impl Module {
    /// Returns `true` if this module is marked as a foreign-interface
    /// boundary.
    pub fn is_foreign_module(&self) -> bool {
        self.foreign_name.is_some()
    }
}

/// The single scope nested directly under a module's topscope.
///
/// A module's topscope carries exactly one scope with flat lists; this
/// flattens both into one struct rather than modeling an intermediate
/// `Scope` node with no behavior of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopScope {
    /// Every `Var` declared in this scope.
    pub vars: Arena<VarId, Var>,
    /// Every scheduled region in this scope, in declaration order.
    pub actives: Vec<Active>,
    /// Every `CFunc` the scheduler allocated in this scope.
    pub cfuncs: Arena<CFuncId, CFunc>,
    /// Every interned sensitivity tree referenced by this scope's actives.
    pub sentrees: Arena<SenTreeId, SenTree>,
    /// Every nested foreign sub-module instance declared in this scope.
    pub foreign_instances: Arena<ForeignInstanceId, ForeignInstance>,
}

/// A signal declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Var {
    /// The declared name.
    pub name: Ident,
    /// The name used when printed in generated Verilog (may differ from
    /// `name` after name-mangling upstream; usually identical).
    pub pretty_name: Ident,
    /// The textual datatype, already rendered by the upstream emitter
    /// (e.g. `"logic [7:0]"`). Opaque here — this stage never inspects or
    /// rewrites datatypes, only reproduces them verbatim.
    pub dtype: String,
    /// Whether this is an input port.
    pub is_input: bool,
    /// Whether this is an output port.
    pub is_output: bool,
    /// Whether this variable is one of the module's primary (externally
    /// visible) I/O signals, as opposed to an internal net.
    pub is_primary_io: bool,
    /// The Verilog keyword used to declare this variable (`"input"`,
    /// `"output"`, `"wire"`, ...).
    pub verilog_kwd: String,
}

/// A scheduled region: a sensitivity tree plus the statements it guards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Active {
    /// The sensitivity tree, or `None` for an unconditionally-active region
    /// (not used by this stage directly, but kept for IR fidelity).
    pub senses: Option<SenTreeId>,
    /// The statements in this region, typically one or more `CCall`s.
    pub stmts: Vec<Stmt>,
}

/// A scheduled entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CFunc {
    /// This function's name.
    pub name: Ident,
    /// The statements in this function's body, post-schedule. An empty
    /// body means this `CFunc` is not an eval entry point (see
    /// [`crate::ref_collector`]'s eval discovery protocol).
    pub body: Vec<Stmt>,
}

/// A sensitivity-list tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenTree {
    /// Whether this sensitivity is the special "settle" fixed-point phase.
    pub has_settle: bool,
    /// Whether this sensitivity tree marks an `initial` block.
    pub has_initial: bool,
    /// The edges/levels in this sensitivity list, serialized verbatim by
    /// `Display` — this stage never simplifies or reorders them.
    pub edges: Vec<SenEdge>,
}

impl std::fmt::Display for SenTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@(")?;
        for (i, edge) in self.edges.iter().enumerate() {
            if i > 0 {
                write!(f, " or ")?;
            }
            write!(f, "{edge}")?;
        }
        write!(f, ")")
    }
}

/// One edge or level trigger in a sensitivity list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenEdge {
    /// `"posedge"`, `"negedge"`, or empty for a plain level trigger.
    pub edge_kind: String,
    /// The name of the signal whose edge/level this trigger watches.
    pub signal_name: Ident,
}

impl std::fmt::Display for SenEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.edge_kind.is_empty() {
            write!(f, "{}", self.signal_name.as_raw())
        } else {
            write!(f, "{} {}", self.edge_kind, self.signal_name.as_raw())
        }
    }
}

/// A nested foreign sub-module instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignInstance {
    /// The instance name, used to build shadow-port and scope-debug names.
    pub name: Ident,
    /// The inner module's type name.
    pub mod_name: Ident,
}

/// A statement inside a `CFunc` body or `Active` region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// An ordinary (active-region-phase) assignment.
    NodeAssign {
        /// The right-hand side.
        rhs: Expr,
        /// The left-hand side.
        lhs: Expr,
    },
    /// A non-blocking-assignment commit-phase assignment.
    AssignPost {
        /// The right-hand side.
        rhs: Expr,
        /// The left-hand side.
        lhs: Expr,
    },
    /// A call to a scheduled `CFunc`.
    CCall {
        /// The target function.
        func: CFuncId,
        /// The symbol-table expression passed as the callee's argument
        /// (e.g. `"vlSymsp"` for a same-module call, or
        /// `"vlTOPp->__F<instance>->__VlSymsp"` when crossing into a
        /// foreign instance's own symbol table). This is the only thing
        /// that tells a memoized, name-shared callee which instance to
        /// operate on.
        args: String,
    },
    /// A nested foreign-eval site.
    ForeignEvalStmt(ForeignEval),
    /// A textual side-effect emitted verbatim (used by `EvalUnpacker`'s
    /// debug-scope markers).
    Text(String),
}

/// A reference to an inner-module eval, nested under an `Active`/`CFunc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignEval {
    /// The sub-module instance this eval belongs to.
    pub foreign_instance: ForeignInstanceId,
    /// The inner eval's name.
    pub name: Ident,
    /// Whether this eval has no sensitivity guard (executed unconditionally
    /// at the bottom of the outer module's cycle).
    pub unconditional: bool,
    /// Assignments that pull values from inner state into the outer side.
    pub reads: Vec<ForeignRead>,
    /// Assignments that push outer-side values into inner state.
    pub writes: Vec<ForeignWrite>,
    /// Names of other inner evals this one requires to run first.
    pub depends: Vec<ForeignDepend>,
}

/// A single-port pull from inner state to the outer side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignRead {
    /// The inner port name.
    pub port_name: Ident,
    /// The inner port's datatype, rendered verbatim.
    pub dtype: String,
    /// The outer-side destination expression.
    pub dst: Expr,
}

/// A single-port push from the outer side to inner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignWrite {
    /// The inner port name.
    pub port_name: Ident,
    /// The inner port's datatype, rendered verbatim.
    pub dtype: String,
    /// The outer-side source expression.
    pub src: Expr,
}

/// A declared cross-eval dependency within a sub-module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignDepend {
    /// The name of the inner eval this one depends on.
    pub name: Ident,
}

/// An expression tree. Only the leaf shapes this stage's traversal needs to
/// recognize (variable references) are modeled structurally; everything
/// else is an opaque, reproduced-verbatim blob, since this stage never
/// evaluates or rewrites expression semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// A reference to a declared `Var`.
    VarRef(VarId),
    /// Any other expression shape, reproduced verbatim when cloned into
    /// shadow-variable assignments.
    Opaque(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(n: u32) -> Ident {
        Ident::from_raw(n)
    }

    #[test]
    fn module_keyword_text() {
        assert_eq!(ModuleKeyword::Module.as_str(), "module");
        assert_eq!(ModuleKeyword::Macromodule.as_str(), "macromodule");
        assert_eq!(ModuleKeyword::Program.as_str(), "program");
    }

    #[test]
    fn foreign_module_detection() {
        let m = Module {
            name: ident(0),
            kwd: ModuleKeyword::Module,
            foreign_name: Some(ident(1)),
            topscope: TopScope::default(),
            span: Span::DUMMY,
        };
        assert!(m.is_foreign_module());

        let m2 = Module {
            foreign_name: None,
            ..m
        };
        assert!(!m2.is_foreign_module());
    }

    #[test]
    fn sentree_display_posedge() {
        let t = SenTree {
            has_settle: false,
            has_initial: false,
            edges: vec![SenEdge {
                edge_kind: "posedge".into(),
                signal_name: ident(3),
            }],
        };
        assert_eq!(format!("{t}"), "@(posedge 3)");
    }

    #[test]
    fn sentree_display_multiple_edges() {
        let t = SenTree {
            has_settle: false,
            has_initial: false,
            edges: vec![
                SenEdge {
                    edge_kind: String::new(),
                    signal_name: ident(1),
                },
                SenEdge {
                    edge_kind: String::new(),
                    signal_name: ident(2),
                },
            ],
        };
        assert_eq!(format!("{t}"), "@(1 or 2)");
    }

    #[test]
    fn netlist_arena_alloc() {
        let mut net = Netlist::new();
        let m = Module {
            name: ident(0),
            kwd: ModuleKeyword::Module,
            foreign_name: None,
            topscope: TopScope::default(),
            span: Span::DUMMY,
        };
        let id = net.modules.alloc(m);
        assert_eq!(net.modules.get(id).name, ident(0));
    }

    #[test]
    fn serde_roundtrip_var() {
        let v = Var {
            name: ident(5),
            pretty_name: ident(5),
            dtype: "logic".into(),
            is_input: true,
            is_output: false,
            is_primary_io: true,
            verilog_kwd: "input".into(),
        };
        let json = serde_json::to_string(&v).unwrap();
        let back: Var = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, v.name);
        assert!(back.is_input);
    }
}
