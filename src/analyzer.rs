//! The analyzer façade (§4.G): the one public entry point each of the three
//! engines is driven through. Owns the z3 context for concolic runs; the
//! concrete and sign engines don't need one.

use std::collections::BTreeSet;
use std::rc::Rc;

use z3::ast::{Ast, Bool, Int};
use z3::{Config, Context, SatResult, Solver};

use crate::class_table::{ClassProvider, ParamKind, Resolution};
use crate::dispatcher::{CappedOutcome, Dispatcher, RunOutcome};
use crate::error::ImplError;
use crate::frame::MethodId;
use crate::semantics::concolic::{ConcolicSemantics, ConcolicVal};
use crate::semantics::concrete::ConcreteSemantics;
use crate::semantics::sign;
use crate::value::{Seed, Value};
use crate::verdict::{Verdict, Witness};

const DEFAULT_STEP_CAP: usize = 10_000;
const DEFAULT_QUERY_CAP: usize = 64;

/// Runs a method to completion under concrete semantics and returns its
/// return value, or the exception it raised (§4.G "run_method").
pub fn run_method(
    classes: &dyn ClassProvider,
    class: &str,
    method: &str,
    args: &[Seed],
) -> Result<RunOutcome<Value>, ImplError> {
    let desc = match classes.method(class, method) {
        Resolution::Known(desc) => desc,
        _ => {
            return Err(ImplError::UnresolvedMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
        }
    };
    let mut semantics = ConcreteSemantics::new();
    let mut locals = semantics.wrap(args);
    locals.resize(desc.locals_count, Value::Void);
    let code = Rc::new(desc.instructions.clone());
    let mut dispatcher = Dispatcher::new(classes, MethodId::new(class, method), code, locals, semantics);
    dispatcher.run()
}

/// As `run_method`, but also returns whatever reached `print` along the way
/// (§4.D: `ConcreteSemantics::output`).
pub fn run_method_with_output(
    classes: &dyn ClassProvider,
    class: &str,
    method: &str,
    args: &[Seed],
) -> Result<(RunOutcome<Value>, String), ImplError> {
    let desc = match classes.method(class, method) {
        Resolution::Known(desc) => desc,
        _ => {
            return Err(ImplError::UnresolvedMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
        }
    };
    let mut semantics = ConcreteSemantics::new();
    let mut locals = semantics.wrap(args);
    locals.resize(desc.locals_count, Value::Void);
    let code = Rc::new(desc.instructions.clone());
    let mut dispatcher = Dispatcher::new(classes, MethodId::new(class, method), code, locals, semantics);
    let outcome = dispatcher.run()?;
    Ok((outcome, dispatcher.semantics.output().to_string()))
}

/// Runs the sign-lattice fixpoint over a method and returns every verdict
/// reachable under the abstraction (§4.E).
pub fn analyze_signs(classes: &dyn ClassProvider, class: &str, method: &str) -> Result<BTreeSet<Verdict>, ImplError> {
    sign::run_method_analysis(classes, class, method)
}

/// The concolic search's conclusion: the first non-`No` verdict found along
/// some path, or `No` if the search exhausted all paths without one, or
/// `Maybe` if a step or query budget ran out first (§4.F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcolicReport {
    pub verdict: Verdict,
    pub witness: Option<Witness>,
}

/// Drives the concolic search: run with the current concrete seed, and if
/// the run ended in `No`, ask the solver for a model of the negated path
/// condition to seed the next run. Stops at the first run whose verdict is
/// not `No`, or once `query_cap` runs have been tried (§4.F termination).
pub fn concolic(classes: &dyn ClassProvider, class: &str, method: &str) -> Result<ConcolicReport, ImplError> {
    concolic_with_caps(classes, class, method, DEFAULT_STEP_CAP, DEFAULT_QUERY_CAP)
}

pub fn concolic_with_caps(
    classes: &dyn ClassProvider,
    class: &str,
    method: &str,
    step_cap: usize,
    query_cap: usize,
) -> Result<ConcolicReport, ImplError> {
    let desc = match classes.method(class, method) {
        Resolution::Known(desc) => desc,
        _ => {
            return Err(ImplError::UnresolvedMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
        }
    };

    let cfg = Config::new();
    let ctx = Context::new(&cfg);

    // One persistent symbolic scalar per int/bool parameter, reused across
    // every run; array parameters get a symbolic length only (§4.F).
    enum ParamSym<'ctx> {
        Int(Int<'ctx>),
        Bool(Bool<'ctx>),
        ArrayLen(Int<'ctx>),
        Opaque,
    }
    let param_syms: Vec<ParamSym> = desc
        .params
        .iter()
        .enumerate()
        .map(|(i, kind)| match kind {
            ParamKind::Int => ParamSym::Int(Int::new_const(&ctx, format!("p{}", i))),
            ParamKind::Bool => ParamSym::Bool(Bool::new_const(&ctx, format!("p{}", i))),
            ParamKind::IntArray => ParamSym::ArrayLen(Int::new_const(&ctx, format!("p{}_len", i))),
            ParamKind::Other => ParamSym::Opaque,
        })
        .collect();

    let solver = Solver::new(&ctx);
    let mut model_seed = match solver.check() {
        SatResult::Sat => solver.get_model(),
        _ => None,
    };

    for _ in 0..query_cap {
        let mut concrete: Vec<i64> = Vec::with_capacity(param_syms.len());
        for sym in &param_syms {
            let value = model_seed
                .as_ref()
                .and_then(|m| match sym {
                    ParamSym::Int(s) => m.eval(s, true).and_then(|v| v.as_i64()),
                    ParamSym::ArrayLen(s) => m.eval(s, true).and_then(|v| v.as_i64()).map(|n| n.max(0)),
                    ParamSym::Bool(s) => m.eval(s, true).and_then(|v| v.as_bool()).map(|b| b as i64),
                    ParamSym::Opaque => Some(0),
                })
                .unwrap_or(0);
            concrete.push(value);
        }

        let mut semantics = ConcolicSemantics::new(&ctx);
        let mut locals = Vec::with_capacity(desc.locals_count);
        for (sym, value) in param_syms.iter().zip(concrete.iter()) {
            locals.push(match sym {
                ParamSym::Int(s) => ConcolicVal::Int { concrete: *value as i32, sym: s.clone() },
                ParamSym::Bool(s) => ConcolicVal::Bool { concrete: *value != 0, sym: s.clone() },
                ParamSym::ArrayLen(len_sym) => {
                    semantics_new_array(&mut semantics, *value as i32, len_sym.clone())?
                }
                ParamSym::Opaque => ConcolicVal::Null,
            });
        }
        locals.resize(desc.locals_count, ConcolicVal::Void);

        let code = Rc::new(desc.instructions.clone());
        let mut dispatcher = Dispatcher::new(classes, MethodId::new(class, method), code, locals, semantics);

        let outcome = match dispatcher.run_capped(step_cap)? {
            CappedOutcome::Capped => {
                return Ok(ConcolicReport {
                    verdict: Verdict::Maybe,
                    witness: Some(Witness::ConcreteArgs(concrete)),
                })
            }
            CappedOutcome::Finished(outcome) => outcome,
        };

        if let RunOutcome::Excepted(verdict) = outcome {
            if verdict != Verdict::No {
                return Ok(ConcolicReport {
                    verdict,
                    witness: Some(Witness::ConcreteArgs(concrete)),
                });
            }
        }

        let path = dispatcher.semantics.path_condition();
        let refs: Vec<&Bool> = path.iter().collect();
        let conjoined = if refs.is_empty() {
            Bool::from_bool(&ctx, true)
        } else {
            refs[0].and(&refs[1..])
        };
        let negated = conjoined.not();
        let search_solver = Solver::new(&ctx);
        match search_solver.check_assumptions(&[negated]) {
            SatResult::Sat => model_seed = search_solver.get_model(),
            _ => {
                return Ok(ConcolicReport { verdict: Verdict::No, witness: None });
            }
        }
    }

    Ok(ConcolicReport { verdict: Verdict::Maybe, witness: None })
}

fn semantics_new_array<'ctx>(
    semantics: &mut ConcolicSemantics<'ctx>,
    len: i32,
    len_sym: Int<'ctx>,
) -> Result<ConcolicVal<'ctx>, ImplError> {
    use crate::instr::ElementType;
    use crate::semantics::Semantics;
    let length = ConcolicVal::Int { concrete: len, sym: len_sym };
    semantics.new_array(ElementType::Int, length)
}
