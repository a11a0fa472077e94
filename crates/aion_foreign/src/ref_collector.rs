//! Walks a foreign module's post-schedule IR and derives, per eval entry
//! point, its port read/write partition and inter-eval dependency graph.
//!
//! Capture mode (`CaptureMode`) and the post-NBA flag are explicit function
//! parameters rather than visitor instance state, and the "which variables
//! does an `AssignPost` ever write" question is answered by a single
//! read-only pre-pass (`compute_post_vars`) instead of a scratch flag
//! mutated mid-walk.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use aion_common::{Ident, Interner};

// `Ident` does not implement `Ord` (it is an opaque interner handle, and the
// interner gives no total order beyond insertion). Sets keyed by inner-eval
// identity sort on the `Ident`'s raw index instead; this is a stable, if
// arbitrary, deterministic order, which is all the determinism requirement
// calls for.

use crate::errors::FieError;
use crate::ids::{CFuncId, ForeignInstanceId, SenTreeId, VarId};
use crate::ir::{Active, CFunc, Expr, ForeignEval, Module, Stmt, TopScope};

/// The kind of scheduled block an eval entry point sits under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// An `always`-style block.
    Always,
    /// An `initial` block.
    Initial,
    /// A `final` block. The collector never constructs this variant; kept
    /// for API completeness against a front-end that might one day produce
    /// it.
    Final,
}

/// A `(Var, isPost)` pair, ordered lexicographically by variable identity
/// then by the post flag, matching the determinism requirements on output
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriteTag {
    /// The written variable.
    pub var: VarId,
    /// Whether this write is a non-blocking (NBA) commit-phase write.
    pub is_post: bool,
}

/// One eval entry point's collected reference information.
#[derive(Debug, Clone)]
pub struct EvalInfo {
    /// The kind of block this eval sits under.
    pub block_type: BlockType,
    /// The enclosing `Active`'s sensitivity tree, if any.
    pub sensesp: Option<SenTreeId>,
    /// The `CFunc` that realizes this eval.
    pub funcp: CFuncId,
    /// Primary-I/O reads.
    pub port_reads: BTreeSet<VarId>,
    /// Primary-I/O writes, tagged pre/post.
    pub port_writes: BTreeSet<WriteTag>,
    /// All reads, including internal signals (dependency derivation only).
    pub all_reads: BTreeSet<VarId>,
    /// All writes, including internal signals (dependency derivation only).
    pub all_writes: BTreeSet<WriteTag>,
    /// Nested foreign-eval sites inside this eval, keyed by
    /// `(instance, eval name's raw interner index)`.
    pub inner_evals: BTreeSet<(ForeignInstanceId, u32)>,
    /// Declared nested dependencies inside this eval, keyed the same way.
    pub inner_depends: BTreeSet<(ForeignInstanceId, u32)>,
    /// Indices into the owning `RefCollector`'s eval list that this eval
    /// depends on.
    pub depends: BTreeSet<usize>,
}

impl EvalInfo {
    fn new(block_type: BlockType, sensesp: Option<SenTreeId>, funcp: CFuncId) -> Self {
        Self {
            block_type,
            sensesp,
            funcp,
            port_reads: BTreeSet::new(),
            port_writes: BTreeSet::new(),
            all_reads: BTreeSet::new(),
            all_writes: BTreeSet::new(),
            inner_evals: BTreeSet::new(),
            inner_depends: BTreeSet::new(),
            depends: BTreeSet::new(),
        }
    }

    fn has_settle(&self, sentrees: &aion_ir::arena::Arena<SenTreeId, crate::ir::SenTree>) -> bool {
        self.sensesp
            .map(|id| sentrees.get(id).has_settle)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureMode {
    Read,
    Write,
}

/// Computes the set of variables ever written by an `AssignPost` anywhere
/// in the module, across every `CFunc` body. Consulted read-only by the
/// main walk, which avoids any order-dependent scratch-flag propagation.
pub fn compute_post_vars(topscope: &TopScope) -> HashSet<VarId> {
    let mut post_vars = HashSet::new();
    for cfunc in topscope.cfuncs.values() {
        collect_post_vars_stmts(&cfunc.body, &mut post_vars);
    }
    for active in &topscope.actives {
        collect_post_vars_stmts(&active.stmts, &mut post_vars);
    }
    post_vars
}

fn collect_post_vars_stmts(stmts: &[Stmt], post_vars: &mut HashSet<VarId>) {
    for stmt in stmts {
        if let Stmt::AssignPost { lhs, .. } = stmt {
            if let Expr::VarRef(id) = lhs {
                post_vars.insert(*id);
            }
        }
    }
}

/// Collects `EvalInfo` records and their dependency graph for one module.
pub struct RefCollector {
    /// The module's primary I/O, in declaration order.
    pub ports: Vec<VarId>,
    /// One record per eval entry point, in discovery order.
    pub evals: Vec<EvalInfo>,
    post_vars: HashSet<VarId>,
}

impl RefCollector {
    /// Walks `module`'s topscope and builds the collector state.
    pub fn new(module: &Module) -> Result<Self, FieError> {
        let topscope = &module.topscope;
        let post_vars = compute_post_vars(topscope);

        let mut ports = Vec::new();
        for (id, var) in topscope.vars.iter() {
            if var.is_primary_io && (var.is_input || var.is_output) {
                ports.push(id);
            }
        }

        let mut evals = Vec::new();
        for active in &topscope.actives {
            walk_active(active, topscope, &post_vars, &mut evals)?;
        }

        let mut collector = Self {
            ports,
            evals,
            post_vars,
        };
        collector.build_depends(topscope);
        Ok(collector)
    }

    /// Returns every primary input port that no eval ever reads — the
    /// wrapper emits a default `foreign_write` for each, since the outer
    /// side otherwise has no indication it must ever populate the shadow.
    pub fn default_write_ports(&self, topscope: &TopScope) -> Vec<VarId> {
        let mut all_port_reads: BTreeSet<VarId> = BTreeSet::new();
        for eval in &self.evals {
            all_port_reads.extend(eval.port_reads.iter().copied());
        }
        self.ports
            .iter()
            .copied()
            .filter(|&p| topscope.vars.get(p).is_input && !all_port_reads.contains(&p))
            .collect()
    }

    fn build_depends(&mut self, topscope: &TopScope) {
        let mut generators: BTreeMap<VarId, Vec<usize>> = BTreeMap::new();
        let mut inner_evals_index: BTreeMap<(ForeignInstanceId, u32), Vec<usize>> =
            BTreeMap::new();

        for (i, eval) in self.evals.iter().enumerate() {
            for tag in &eval.all_writes {
                generators.entry(tag.var).or_default().push(i);
            }
            for key in &eval.inner_evals {
                inner_evals_index.entry(*key).or_default().push(i);
            }
        }

        for i in 0..self.evals.len() {
            let mut new_depends = BTreeSet::new();

            let reads: Vec<VarId> = self.evals[i].all_reads.iter().copied().collect();
            for var in reads {
                if let Some(producers) = generators.get(&var) {
                    for &p in producers {
                        if p == i {
                            continue;
                        }
                        if self.settle_filtered(i, p, topscope) {
                            continue;
                        }
                        new_depends.insert(p);
                    }
                }
            }

            let inner_depends: Vec<(ForeignInstanceId, u32)> =
                self.evals[i].inner_depends.iter().copied().collect();
            for key in inner_depends {
                if let Some(producers) = inner_evals_index.get(&key) {
                    for &p in producers {
                        if p == i {
                            continue;
                        }
                        if self.settle_filtered(i, p, topscope) {
                            continue;
                        }
                        new_depends.insert(p);
                    }
                }
            }

            self.evals[i].depends = new_depends;
        }
    }

    /// Implements invariant 4: a settle-phase eval may only depend on
    /// other settle-phase evals.
    fn settle_filtered(&self, consumer: usize, producer: usize, topscope: &TopScope) -> bool {
        self.evals[consumer].has_settle(&topscope.sentrees)
            && !self.evals[producer].has_settle(&topscope.sentrees)
    }

    /// Synthesizes `_foreign<name>` trace stub `CFunc`s for every unique
    /// eval-target function, if tracing is enabled. Returns the stubs in a
    /// deterministic order (first-seen order over the eval list, not a
    /// hash-set iteration order).
    pub fn add_entry_points(&self, topscope: &TopScope, interner: &Interner) -> Vec<CFunc> {
        let mut seen = BTreeSet::new();
        let mut stubs = Vec::new();
        for eval in &self.evals {
            if seen.insert(eval.funcp) {
                let orig_name = interner.resolve(topscope.cfuncs.get(eval.funcp).name);
                let stub_name = interner.get_or_intern(&format!("_foreign{orig_name}"));
                stubs.push(CFunc {
                    name: stub_name,
                    body: vec![
                        Stmt::CCall {
                            func: eval.funcp,
                            args: "vlSymsp".to_string(),
                        },
                        Stmt::Text("vlSymsp->__Vm_activity = true;\n".to_string()),
                    ],
                });
            }
        }
        stubs
    }
}

fn walk_active(
    active: &Active,
    topscope: &TopScope,
    post_vars: &HashSet<VarId>,
    evals: &mut Vec<EvalInfo>,
) -> Result<(), FieError> {
    for stmt in &active.stmts {
        walk_top_level_stmt(stmt, active.senses, topscope, post_vars, evals, None)?;
    }
    Ok(())
}

/// Walks one statement at the top level of an `Active` region (`cur_eval`
/// is `None` here) or recursively within an eval's body (`cur_eval` is
/// `Some`). A `CCall` reached with `cur_eval = None` whose target has a
/// non-empty body starts a new eval; a `CCall` reached with `cur_eval =
/// Some` does not — its body's statements are folded into the current eval.
#[allow(clippy::too_many_arguments)]
fn walk_top_level_stmt(
    stmt: &Stmt,
    senses: Option<SenTreeId>,
    topscope: &TopScope,
    post_vars: &HashSet<VarId>,
    evals: &mut Vec<EvalInfo>,
    cur_eval: Option<usize>,
) -> Result<(), FieError> {
    match stmt {
        Stmt::CCall { func, .. } => {
            let target = topscope.cfuncs.get(*func);
            if target.body.is_empty() {
                return Ok(());
            }
            match cur_eval {
                None => {
                    let block_type = if senses.map(|s| topscope.sentrees.get(s).has_initial) == Some(true)
                    {
                        BlockType::Initial
                    } else {
                        BlockType::Always
                    };
                    let idx = evals.len();
                    evals.push(EvalInfo::new(block_type, senses, *func));
                    for inner in &target.body {
                        walk_top_level_stmt(
                            inner,
                            senses,
                            topscope,
                            post_vars,
                            evals,
                            Some(idx),
                        )?;
                    }
                }
                Some(idx) => {
                    for inner in &target.body {
                        walk_top_level_stmt(
                            inner,
                            senses,
                            topscope,
                            post_vars,
                            evals,
                            Some(idx),
                        )?;
                    }
                }
            }
            Ok(())
        }
        Stmt::NodeAssign { rhs, lhs } => {
            if let Some(idx) = cur_eval {
                capture_expr(rhs, CaptureMode::Read, false, post_vars, topscope, &mut evals[idx]);
                capture_expr(lhs, CaptureMode::Write, false, post_vars, topscope, &mut evals[idx]);
            }
            Ok(())
        }
        Stmt::AssignPost { rhs, lhs } => {
            if let Some(idx) = cur_eval {
                capture_expr(rhs, CaptureMode::Read, false, post_vars, topscope, &mut evals[idx]);
                capture_expr(lhs, CaptureMode::Write, true, post_vars, topscope, &mut evals[idx]);
            }
            Ok(())
        }
        Stmt::ForeignEvalStmt(fe) => {
            if fe.unconditional {
                return Ok(());
            }
            let idx = cur_eval.ok_or_else(|| FieError::ConditionalEvalOutsideEval {
                eval_name: resolve_placeholder(fe.name),
            })?;
            walk_foreign_eval(fe, topscope, &mut evals[idx]);
            Ok(())
        }
        Stmt::Text(_) => Ok(()),
    }
}

// The collector never has an `Interner` handle in scope during the walk
// (capture is structural, not textual); error messages carry the raw
// `Ident` index and are resolved by the caller if needed for display.
fn resolve_placeholder(name: Ident) -> String {
    format!("<ident #{}>", name.as_raw())
}

fn capture_expr(
    expr: &Expr,
    mode: CaptureMode,
    force_post: bool,
    post_vars: &HashSet<VarId>,
    topscope: &TopScope,
    eval: &mut EvalInfo,
) {
    match expr {
        Expr::VarRef(var_id) => match mode {
            CaptureMode::Write => {
                let is_post = force_post || post_vars.contains(var_id);
                eval.all_writes.insert(WriteTag {
                    var: *var_id,
                    is_post,
                });
                if topscope.vars.get(*var_id).is_primary_io {
                    eval.port_writes.insert(WriteTag {
                        var: *var_id,
                        is_post,
                    });
                }
            }
            CaptureMode::Read => {
                eval.all_reads.insert(*var_id);
                if topscope.vars.get(*var_id).is_primary_io {
                    eval.port_reads.insert(*var_id);
                }
            }
        },
        Expr::Opaque(_) => {}
    }
}

/// `ForeignEval` handling: the deliberate read/write inversion. A
/// `ForeignRead` ("pull from inner") is a *write* to the outer signal; a
/// `ForeignWrite` ("push to inner") is a *read* of the outer signal. Do not
/// "fix" this — it is the most commonly mis-ported detail in this stage.
fn walk_foreign_eval(fe: &ForeignEval, topscope: &TopScope, eval: &mut EvalInfo) {
    eval.inner_evals
        .insert((fe.foreign_instance, fe.name.as_raw()));

    for read in &fe.reads {
        capture_expr(
            &read.dst,
            CaptureMode::Write,
            false,
            &HashSet::new(),
            topscope,
            eval,
        );
    }
    for write in &fe.writes {
        capture_expr(
            &write.src,
            CaptureMode::Read,
            false,
            &HashSet::new(),
            topscope,
            eval,
        );
    }
    for depend in &fe.depends {
        eval.inner_depends
            .insert((fe.foreign_instance, depend.name.as_raw()));
    }
}
