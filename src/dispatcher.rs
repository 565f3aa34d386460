//! The step loop shared by the concrete and concolic engines (§4.C).
//!
//! `Dispatcher<S>` owns the call stack and drives one [`Semantics`]
//! implementation through a method's decoded instructions, handling
//! `invoke`/`return` frame management generically so neither plug-in has
//! to repeat it.
//!
//! Set `VM_ANALYZER_TRACE=1` (debug builds only) to print every `(pc,
//! instruction)` pair to stderr as it's dispatched (§4.K).

use std::rc::Rc;

use crate::class_table::{ClassProvider, Resolution};
use crate::frame::{Frame, MethodId};
use crate::instr::Instruction;
use crate::semantics::{Outcome, Semantics};
use crate::verdict::Verdict;
use crate::ImplError;

pub enum RunOutcome<V> {
    Returned(V),
    Excepted(Verdict),
}

/// Result of [`Dispatcher::run_capped`]: either the run concluded within
/// the step budget, or the budget ran out first (§4.F termination: a path
/// exceeding its step cap is recorded as `Maybe`).
pub enum CappedOutcome<V> {
    Finished(RunOutcome<V>),
    Capped,
}

enum StepEffect {
    Continue,
    /// The whole call stack unwound: yield this value to the façade.
    Finished,
    Excepted(Verdict),
}

pub struct Dispatcher<'c, S: Semantics> {
    classes: &'c dyn ClassProvider,
    frames: Vec<Frame<S::Value>>,
    code_by_frame: Vec<Rc<Vec<Instruction>>>,
    last_return: Option<S::Value>,
    pub semantics: S,
}

impl<'c, S: Semantics> Dispatcher<'c, S> {
    pub fn new(classes: &'c dyn ClassProvider, method: MethodId, code: Rc<Vec<Instruction>>, locals: Vec<S::Value>, semantics: S) -> Self {
        Self {
            classes,
            frames: vec![Frame {
                method,
                pc: 0,
                locals,
                opstack: Vec::new(),
            }],
            code_by_frame: vec![code],
            last_return: None,
            semantics,
        }
    }

    fn current_code(&self) -> Option<Rc<Vec<Instruction>>> {
        self.code_by_frame.last().cloned()
    }

    /// Runs to completion: either the whole call stack returns, or a path
    /// exception terminates the run.
    pub fn run(&mut self) -> Result<RunOutcome<S::Value>, ImplError> {
        loop {
            match self.step()? {
                StepEffect::Continue => continue,
                StepEffect::Finished => {
                    let value = self.last_return.take().unwrap_or_else(|| self.semantics.void());
                    return Ok(RunOutcome::Returned(value));
                }
                StepEffect::Excepted(v) => return Ok(RunOutcome::Excepted(v)),
            }
        }
    }

    /// As `run`, but bails out with `Capped` once `cap` steps have executed
    /// without the call stack unwinding (§4.F: used by the concolic search
    /// loop to bound a single path).
    pub fn run_capped(&mut self, cap: usize) -> Result<CappedOutcome<S::Value>, ImplError> {
        for _ in 0..cap {
            match self.step()? {
                StepEffect::Continue => continue,
                StepEffect::Finished => {
                    let value = self.last_return.take().unwrap_or_else(|| self.semantics.void());
                    return Ok(CappedOutcome::Finished(RunOutcome::Returned(value)));
                }
                StepEffect::Excepted(v) => return Ok(CappedOutcome::Finished(RunOutcome::Excepted(v))),
            }
        }
        Ok(CappedOutcome::Capped)
    }

    fn step(&mut self) -> Result<StepEffect, ImplError> {
        let code = self
            .current_code()
            .ok_or_else(|| ImplError::MalformedBytecode("empty call stack".into()))?;
        let pc = self.frames.last().unwrap().pc;
        let instr = code
            .get(pc)
            .ok_or_else(|| ImplError::MalformedBytecode(format!("pc {} out of range", pc)))?
            .clone();
        #[cfg(debug_assertions)]
        if std::env::var("VM_ANALYZER_TRACE").is_ok() {
            eprintln!("pc={} instr={:?}", pc, instr);
        }
        self.dispatch(&instr)
    }

    fn frame(&mut self) -> &mut Frame<S::Value> {
        self.frames.last_mut().expect("non-empty call stack")
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<StepEffect, ImplError> {
        match instr {
            Instruction::Push(lit) => {
                let v = match lit {
                    crate::instr::Literal::Int(n) => self.semantics.const_int(*n),
                    crate::instr::Literal::Bool(b) => self.semantics.const_bool(*b),
                    crate::instr::Literal::Str(s) => self.semantics.const_str(s),
                };
                self.frame().push(v);
                self.advance();
            }
            Instruction::Load(idx) => {
                let v = self
                    .frame()
                    .locals
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| ImplError::MalformedBytecode(format!("load slot {} out of range", idx)))?;
                self.frame().push(v);
                self.advance();
            }
            Instruction::Store(idx) => {
                let v = self.pop()?;
                let frame = self.frame();
                if *idx >= frame.locals.len() {
                    frame.locals.resize(*idx + 1, v.clone());
                }
                frame.locals[*idx] = v;
                self.advance();
            }
            Instruction::Dup => {
                let v = self.pop()?;
                self.frame().push(v.clone());
                self.frame().push(v);
                self.advance();
            }
            Instruction::Pop => {
                self.pop()?;
                self.advance();
            }
            Instruction::Incr { index, amount } => {
                let frame = self.frame();
                let v = frame
                    .locals
                    .get(*index)
                    .cloned()
                    .ok_or_else(|| ImplError::MalformedBytecode(format!("incr slot {} out of range", index)))?;
                let next = self.semantics.incr(v, *amount)?;
                self.frame().locals[*index] = next;
                self.advance();
            }
            Instruction::Binary(op) => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                match self.semantics.binary(*op, lhs, rhs)? {
                    Outcome::Value(v) => {
                        self.frame().push(v);
                        self.advance();
                    }
                    Outcome::Exception(verdict) => return Ok(StepEffect::Excepted(verdict)),
                }
            }
            Instruction::Negate => {
                let v = self.pop()?;
                let v = self.semantics.negate(v)?;
                self.frame().push(v);
                self.advance();
            }
            Instruction::If(cond, target) => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                if self.semantics.compare(*cond, lhs, rhs)? {
                    self.frame().pc = *target;
                } else {
                    self.advance();
                }
            }
            Instruction::Ifz(cond, target) => {
                let v = self.pop()?;
                if self.semantics.compare_zero(*cond, v)? {
                    self.frame().pc = *target;
                } else {
                    self.advance();
                }
            }
            Instruction::Goto(target) => {
                self.frame().pc = *target;
            }
            Instruction::Return(has_value) => {
                let value = if *has_value {
                    self.pop()?
                } else {
                    self.semantics.void()
                };
                self.code_by_frame.pop();
                self.frames.pop();
                if self.frames.is_empty() {
                    self.last_return = Some(value);
                    return Ok(StepEffect::Finished);
                }
                if *has_value {
                    self.frame().push(value);
                }
            }
            Instruction::New(class) => {
                let v = self.semantics.new_object(class);
                self.frame().push(v);
                self.advance();
            }
            Instruction::NewArray(elem_ty) => {
                let len = self.pop()?;
                let v = self.semantics.new_array(*elem_ty, len)?;
                self.frame().push(v);
                self.advance();
            }
            Instruction::ArrayLength => {
                let arr = self.pop()?;
                let v = self.semantics.array_length(arr)?;
                self.frame().push(v);
                self.advance();
            }
            Instruction::ArrayLoad => {
                let index = self.pop()?;
                let arr = self.pop()?;
                match self.semantics.array_load(arr, index)? {
                    Outcome::Value(v) => {
                        self.frame().push(v);
                        self.advance();
                    }
                    Outcome::Exception(verdict) => return Ok(StepEffect::Excepted(verdict)),
                }
            }
            Instruction::ArrayStore => {
                let value = self.pop()?;
                let index = self.pop()?;
                let arr = self.pop()?;
                if let Some(verdict) = self.semantics.array_store(arr, index, value)? {
                    return Ok(StepEffect::Excepted(verdict));
                }
                self.advance();
            }
            Instruction::Get(field) => {
                let v = self.semantics.get_field(field);
                self.frame().push(v);
                self.advance();
            }
            Instruction::Invoke {
                class,
                method,
                arity,
                returns,
            } => {
                return self.dispatch_invoke(class, method, *arity, *returns);
            }
            Instruction::Throw => {
                let v = self.pop()?;
                let verdict = self.semantics.throw(v)?;
                return Ok(StepEffect::Excepted(verdict));
            }
            Instruction::Print => {
                let v = self.pop()?;
                self.semantics.print(v);
                self.advance();
            }
        }
        Ok(StepEffect::Continue)
    }

    fn dispatch_invoke(
        &mut self,
        class: &str,
        method: &str,
        arity: usize,
        returns: bool,
    ) -> Result<StepEffect, ImplError> {
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            args.push(self.pop()?);
        }
        args.reverse();

        match self.classes.method(class, method) {
            Resolution::Known(desc) => {
                let mut locals = vec![self.semantics.const_int(0); desc.locals_count];
                for (slot, arg) in locals.iter_mut().zip(args.into_iter()) {
                    *slot = arg;
                }
                let code = Rc::new(desc.instructions.clone());
                self.code_by_frame.push(code);
                self.frames.push(Frame {
                    method: MethodId::new(class.to_string(), method.to_string()),
                    pc: 0,
                    locals,
                    opstack: Vec::new(),
                });
            }
            Resolution::PrintStub => {
                if let Some(v) = args.into_iter().next() {
                    self.semantics.print(v);
                }
                self.advance();
            }
            Resolution::Stub => {
                if returns {
                    let v = self.semantics.const_int(0);
                    self.frame().push(v);
                }
                self.advance();
            }
        }
        Ok(StepEffect::Continue)
    }

    fn pop(&mut self) -> Result<S::Value, ImplError> {
        self.frame()
            .pop()
            .ok_or_else(|| ImplError::MalformedBytecode("operand stack underflow".into()))
    }

    fn advance(&mut self) {
        self.frame().pc += 1;
    }
}
