//! Rewrites `ForeignEval` nodes into the ordinary IR sequence that realizes
//! a cross-boundary call, for every module (not only foreign-interface
//! sources — a module can *instantiate* a foreign sub-module without being
//! one itself).

use std::collections::HashMap;

use aion_common::{Ident, Interner};

use crate::errors::FieError;
use crate::ids::{CFuncId, ForeignInstanceId, VarId};
use crate::ir::{CFunc, Expr, Module, Stmt, TopScope, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Lvalue,
    Rvalue,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Lvalue => "lvalue",
            Direction::Rvalue => "rvalue",
        }
    }
}

struct ShadowPort {
    var: VarId,
    direction: Direction,
}

/// Per-module unpacking state: the memoized shadow-port cache and the
/// memoized cross-module eval-function declarations.
#[derive(Default)]
pub struct EvalUnpacker {
    port_shadows: HashMap<(ForeignInstanceId, Ident), ShadowPort>,
    eval_funcs: HashMap<(ForeignInstanceId, Ident), CFuncId>,
    uncond_modfuncs: HashMap<Ident, CFuncId>,
}

impl EvalUnpacker {
    /// Creates an unpacker with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites every `ForeignEval` in `module`'s topscope in place.
    pub fn unpack_module(&mut self, module: &mut Module, interner: &Interner) -> Result<(), FieError> {
        let mut uncond_writes = Vec::new();
        let mut uncond_instances: Vec<ForeignInstanceId> = Vec::new();

        let n_actives = module.topscope.actives.len();
        for i in 0..n_actives {
            let stmts = std::mem::take(&mut module.topscope.actives[i].stmts);
            let new_stmts = self.unpack_stmts(
                stmts,
                &mut module.topscope,
                interner,
                &mut uncond_writes,
                &mut uncond_instances,
            )?;
            module.topscope.actives[i].stmts = new_stmts;
        }

        let cfunc_ids: Vec<CFuncId> = module.topscope.cfuncs.iter().map(|(id, _)| id).collect();
        for id in cfunc_ids {
            let body = std::mem::take(&mut module.topscope.cfuncs.get_mut(id).body);
            let new_body = self.unpack_stmts(
                body,
                &mut module.topscope,
                interner,
                &mut uncond_writes,
                &mut uncond_instances,
            )?;
            module.topscope.cfuncs.get_mut(id).body = new_body;
        }

        self.emit_uncond_evals(module, interner, uncond_writes, uncond_instances);
        Ok(())
    }

    fn unpack_stmts(
        &mut self,
        stmts: Vec<Stmt>,
        topscope: &mut TopScope,
        interner: &Interner,
        uncond_writes: &mut Vec<Stmt>,
        uncond_instances: &mut Vec<ForeignInstanceId>,
    ) -> Result<Vec<Stmt>, FieError> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            match stmt {
                Stmt::ForeignEvalStmt(fe) if fe.unconditional => {
                    for write in &fe.writes {
                        let shadow = self.foreign_port_var(
                            fe.foreign_instance,
                            write.port_name,
                            &write.dtype,
                            Direction::Lvalue,
                            topscope,
                            interner,
                        )?;
                        uncond_writes.push(Stmt::NodeAssign {
                            rhs: write.src.clone(),
                            lhs: Expr::VarRef(shadow),
                        });
                    }
                    uncond_instances.push(fe.foreign_instance);
                    // The original `ForeignEvalStmt` is dropped here; its
                    // call is folded into the single `_foreign_uncond`
                    // function synthesized once the whole module is walked.
                }
                Stmt::ForeignEvalStmt(fe) => {
                    let inst = topscope.foreign_instances.get(fe.foreign_instance);
                    let inst_name = interner.resolve(inst.name).to_string();
                    let mod_name = inst.mod_name;

                    out.push(Stmt::Text(format!(
                        "VL_DEBUG_PUSH_FOREIGN_SCOPE(\"{inst_name}\");\n"
                    )));
                    for write in &fe.writes {
                        let shadow = self.foreign_port_var(
                            fe.foreign_instance,
                            write.port_name,
                            &write.dtype,
                            Direction::Lvalue,
                            topscope,
                            interner,
                        )?;
                        out.push(Stmt::NodeAssign {
                            rhs: write.src.clone(),
                            lhs: Expr::VarRef(shadow),
                        });
                    }
                    let eval_func =
                        self.foreign_eval_func(fe.foreign_instance, fe.name, mod_name, topscope, interner);
                    out.push(Stmt::CCall {
                        func: eval_func,
                        args: format!("vlTOPp->__F{inst_name}->__VlSymsp"),
                    });
                    out.push(Stmt::Text("VL_DEBUG_POP_FOREIGN_SCOPE();\n".to_string()));
                    for read in &fe.reads {
                        let shadow = self.foreign_port_var(
                            fe.foreign_instance,
                            read.port_name,
                            &read.dtype,
                            Direction::Rvalue,
                            topscope,
                            interner,
                        )?;
                        out.push(Stmt::NodeAssign {
                            rhs: Expr::VarRef(shadow),
                            lhs: read.dst.clone(),
                        });
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn foreign_port_var(
        &mut self,
        instance: ForeignInstanceId,
        port_name: Ident,
        dtype: &str,
        direction: Direction,
        topscope: &mut TopScope,
        interner: &Interner,
    ) -> Result<VarId, FieError> {
        let key = (instance, port_name);
        if let Some(shadow) = self.port_shadows.get(&key) {
            if shadow.direction != direction {
                let inst = topscope.foreign_instances.get(instance);
                return Err(FieError::ShadowPortDirectionMismatch {
                    instance: interner.resolve(inst.name).to_string(),
                    port: interner.resolve(port_name).to_string(),
                    prev_direction: shadow.direction.as_str(),
                    new_direction: direction.as_str(),
                });
            }
            return Ok(shadow.var);
        }

        let inst = topscope.foreign_instances.get(instance);
        let var_name = format!(
            "__F{}->{}",
            interner.resolve(inst.name),
            interner.resolve(port_name)
        );
        let var_ident = interner.get_or_intern(&var_name);
        let var_id = topscope.vars.alloc(Var {
            name: var_ident,
            pretty_name: var_ident,
            dtype: dtype.to_string(),
            is_input: false,
            is_output: false,
            is_primary_io: false,
            verilog_kwd: "wire".to_string(),
        });
        self.port_shadows.insert(
            key,
            ShadowPort {
                var: var_id,
                direction,
            },
        );
        Ok(var_id)
    }

    fn foreign_eval_func(
        &mut self,
        instance: ForeignInstanceId,
        eval_name: Ident,
        mod_name: Ident,
        topscope: &mut TopScope,
        interner: &Interner,
    ) -> CFuncId {
        let key = (instance, eval_name);
        if let Some(&id) = self.eval_funcs.get(&key) {
            return id;
        }
        let fname = format!("V{}::{}", interner.resolve(mod_name), interner.resolve(eval_name));
        let ident = interner.get_or_intern(&fname);
        // An empty body marks this `CFunc` as declared-only: it is defined
        // in the inner module's own translation unit, not here.
        let id = topscope.cfuncs.alloc(CFunc {
            name: ident,
            body: Vec::new(),
        });
        self.eval_funcs.insert(key, id);
        id
    }

    fn emit_uncond_evals(
        &mut self,
        module: &mut Module,
        interner: &Interner,
        uncond_writes: Vec<Stmt>,
        uncond_instances: Vec<ForeignInstanceId>,
    ) {
        if uncond_writes.is_empty() && uncond_instances.is_empty() {
            return;
        }

        // The activity flag is set first, immediately after entry, before
        // any buffered write or sub-module call — not last.
        let mut body = vec![Stmt::Text("vlSymsp->__Vm_activity = true;\n".to_string())];
        body.extend(uncond_writes);
        let mut seen_modnames = Vec::new();

        for inst_id in &uncond_instances {
            let mod_name = module.topscope.foreign_instances.get(*inst_id).mod_name;
            if seen_modnames.contains(&mod_name) {
                continue;
            }
            seen_modnames.push(mod_name);

            let uncond_func = if let Some(&id) = self.uncond_modfuncs.get(&mod_name) {
                id
            } else {
                let fname = format!("V{}::_foreign_uncond", interner.resolve(mod_name));
                let ident = interner.get_or_intern(&fname);
                let id = module
                    .topscope
                    .cfuncs
                    .alloc(CFunc {
                        name: ident,
                        body: Vec::new(),
                    });
                self.uncond_modfuncs.insert(mod_name, id);
                id
            };

            let inst_name = interner
                .resolve(module.topscope.foreign_instances.get(*inst_id).name)
                .to_string();
            body.push(Stmt::Text(format!(
                "VL_DEBUG_PUSH_FOREIGN_SCOPE(\"{inst_name}\");\n"
            )));
            body.push(Stmt::CCall {
                func: uncond_func,
                args: format!("vlTOPp->__F{inst_name}->__VlSymsp"),
            });
            body.push(Stmt::Text("VL_DEBUG_POP_FOREIGN_SCOPE();\n".to_string()));
        }

        let uncond_name = interner.get_or_intern("_foreign_uncond");
        module.topscope.cfuncs.alloc(CFunc {
            name: uncond_name,
            body,
        });
    }
}
