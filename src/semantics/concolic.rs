//! Concolic value semantics (§4.F): each value carries a concrete witness
//! alongside a z3 symbolic expression in the same sort, and every branch the
//! run actually takes is recorded as a path-condition conjunct. The façade
//! (`crate::analyzer::concolic`) drives the outer search loop that negates
//! one run's path condition to ask the solver for the next input.

use z3::ast::{Ast, Bool, Int};
use z3::Context;

use crate::error::ImplError;
use crate::instr::{BinOp, Condition, ElementType};
use crate::verdict::Verdict;

use super::{Outcome, Semantics};

/// A value paired with its symbolic counterpart. Array cells are stored
/// concretely only (§4.F: "only scalar parameters and array lengths are
/// symbolic; cell contents are concrete") — only scalars and array lengths
/// carry a live symbolic twin.
#[derive(Clone)]
pub enum ConcolicVal<'ctx> {
    Int { concrete: i32, sym: Int<'ctx> },
    Bool { concrete: bool, sym: Bool<'ctx> },
    Ref(usize),
    Str(String),
    Null,
    Void,
}

enum HeapEntry<'ctx> {
    Array {
        element_type: ElementType,
        cells: Vec<i32>,
        len_sym: Int<'ctx>,
    },
    Object {
        class: String,
    },
}

pub struct ConcolicSemantics<'ctx> {
    ctx: &'ctx Context,
    heap: Vec<HeapEntry<'ctx>>,
    path: Vec<Bool<'ctx>>,
    output: String,
}

impl<'ctx> ConcolicSemantics<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            heap: Vec::new(),
            path: Vec::new(),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// The conjuncts accumulated along this run; the façade conjoins and
    /// negates this to find the next path to explore.
    pub fn path_condition(&self) -> &[Bool<'ctx>] {
        &self.path
    }

    fn int_view(&self, v: &ConcolicVal<'ctx>) -> Result<(i32, Int<'ctx>), ImplError> {
        match v {
            ConcolicVal::Int { concrete, sym } => Ok((*concrete, sym.clone())),
            ConcolicVal::Bool { concrete, sym } => Ok((
                *concrete as i32,
                sym.ite(&Int::from_i64(self.ctx, 1), &Int::from_i64(self.ctx, 0)),
            )),
            _ => Err(ImplError::TypeMismatch("expected integral concolic value".into())),
        }
    }

    fn record(&mut self, cond: Bool<'ctx>, taken: bool) {
        self.path.push(if taken { cond } else { cond.not() });
    }

    fn array_entry(&self, id: usize) -> Result<(&ElementType, &[i32], &Int<'ctx>), ImplError> {
        match &self.heap[id] {
            HeapEntry::Array { element_type, cells, len_sym } => Ok((element_type, cells, len_sym)),
            HeapEntry::Object { .. } => Err(ImplError::TypeMismatch("array op on class instance".into())),
        }
    }
}

impl<'ctx> Semantics for ConcolicSemantics<'ctx> {
    type Value = ConcolicVal<'ctx>;

    fn const_int(&mut self, n: i32) -> Self::Value {
        ConcolicVal::Int { concrete: n, sym: Int::from_i64(self.ctx, n as i64) }
    }

    fn const_bool(&mut self, b: bool) -> Self::Value {
        ConcolicVal::Bool { concrete: b, sym: Bool::from_bool(self.ctx, b) }
    }

    fn const_str(&mut self, s: &str) -> Self::Value {
        ConcolicVal::Str(s.to_string())
    }

    fn null(&mut self) -> Self::Value {
        ConcolicVal::Null
    }

    fn void(&mut self) -> Self::Value {
        ConcolicVal::Void
    }

    fn binary(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value) -> Result<Outcome<Self::Value>, ImplError> {
        let (a, asym) = self.int_view(&lhs)?;
        let (b, bsym) = self.int_view(&rhs)?;
        Ok(match op {
            BinOp::Add => Outcome::Value(ConcolicVal::Int {
                concrete: a.wrapping_add(b),
                sym: Int::add(self.ctx, &[&asym, &bsym]),
            }),
            BinOp::Sub => Outcome::Value(ConcolicVal::Int {
                concrete: a.wrapping_sub(b),
                sym: Int::sub(self.ctx, &[&asym, &bsym]),
            }),
            BinOp::Mul => Outcome::Value(ConcolicVal::Int {
                concrete: a.wrapping_mul(b),
                sym: Int::mul(self.ctx, &[&asym, &bsym]),
            }),
            BinOp::Div => {
                let is_zero = bsym._eq(&Int::from_i64(self.ctx, 0));
                if b == 0 {
                    self.record(is_zero, true);
                    Outcome::Exception(Verdict::ArithmeticException)
                } else {
                    self.record(is_zero, false);
                    Outcome::Value(ConcolicVal::Int {
                        concrete: a.wrapping_div(b),
                        sym: asym.div(&bsym),
                    })
                }
            }
        })
    }

    fn negate(&mut self, v: Self::Value) -> Result<Self::Value, ImplError> {
        let (a, asym) = self.int_view(&v)?;
        Ok(ConcolicVal::Int {
            concrete: -a,
            sym: Int::sub(self.ctx, &[&Int::from_i64(self.ctx, 0), &asym]),
        })
    }

    fn incr(&mut self, v: Self::Value, amount: i32) -> Result<Self::Value, ImplError> {
        let (a, asym) = self.int_view(&v)?;
        Ok(ConcolicVal::Int {
            concrete: a.wrapping_add(amount),
            sym: Int::add(self.ctx, &[&asym, &Int::from_i64(self.ctx, amount as i64)]),
        })
    }

    fn compare(&mut self, cond: Condition, lhs: Self::Value, rhs: Self::Value) -> Result<bool, ImplError> {
        let (a, asym) = self.int_view(&lhs)?;
        let (b, bsym) = self.int_view(&rhs)?;
        let taken = cond.eval(a, b);
        let formula = match cond {
            Condition::Eq => asym._eq(&bsym),
            Condition::Ne => asym._eq(&bsym).not(),
            Condition::Lt => asym.lt(&bsym),
            Condition::Le => asym.le(&bsym),
            Condition::Gt => asym.gt(&bsym),
            Condition::Ge => asym.ge(&bsym),
        };
        self.record(formula, taken);
        Ok(taken)
    }

    fn compare_zero(&mut self, cond: Condition, v: Self::Value) -> Result<bool, ImplError> {
        let zero = ConcolicVal::Int { concrete: 0, sym: Int::from_i64(self.ctx, 0) };
        self.compare(cond, v, zero)
    }

    fn new_array(&mut self, element_type: ElementType, length: Self::Value) -> Result<Self::Value, ImplError> {
        let (len, len_sym) = self.int_view(&length)?;
        let len = len.max(0) as usize;
        let id = self.heap.len();
        self.heap.push(HeapEntry::Array { element_type, cells: vec![0; len], len_sym });
        Ok(ConcolicVal::Ref(id))
    }

    fn array_length(&mut self, arr: Self::Value) -> Result<Self::Value, ImplError> {
        let id = match arr {
            ConcolicVal::Ref(id) => id,
            _ => return Err(ImplError::TypeMismatch("expected array reference".into())),
        };
        let (_, cells, len_sym) = self.array_entry(id)?;
        Ok(ConcolicVal::Int { concrete: cells.len() as i32, sym: len_sym.clone() })
    }

    fn array_load(&mut self, arr: Self::Value, index: Self::Value) -> Result<Outcome<Self::Value>, ImplError> {
        let id = match arr {
            ConcolicVal::Ref(id) => id,
            _ => return Err(ImplError::TypeMismatch("expected array reference".into())),
        };
        let (idx, idx_sym) = self.int_view(&index)?;
        let (_, cells, len_sym) = self.array_entry(id)?;
        let cells = cells.to_vec();
        let len_sym = len_sym.clone();
        let in_bounds = idx_sym.ge(&Int::from_i64(self.ctx, 0)).and(&[&idx_sym.lt(&len_sym)]);
        Ok(match usize::try_from(idx).ok().filter(|i| *i < cells.len()) {
            Some(i) => {
                self.record(in_bounds, true);
                let v = cells[i];
                Outcome::Value(ConcolicVal::Int { concrete: v, sym: Int::from_i64(self.ctx, v as i64) })
            }
            None => {
                self.record(in_bounds, false);
                Outcome::Exception(Verdict::IndexOutOfBounds)
            }
        })
    }

    fn array_store(&mut self, arr: Self::Value, index: Self::Value, value: Self::Value) -> Result<Option<Verdict>, ImplError> {
        let id = match arr {
            ConcolicVal::Ref(id) => id,
            _ => return Err(ImplError::TypeMismatch("expected array reference".into())),
        };
        let (idx, idx_sym) = self.int_view(&index)?;
        let (val, _) = self.int_view(&value)?;
        let len_sym = match &self.heap[id] {
            HeapEntry::Array { len_sym, .. } => len_sym.clone(),
            HeapEntry::Object { .. } => return Err(ImplError::TypeMismatch("array_store on class instance".into())),
        };
        let in_bounds = idx_sym.ge(&Int::from_i64(self.ctx, 0)).and(&[&idx_sym.lt(&len_sym)]);
        let cells_len = match &self.heap[id] {
            HeapEntry::Array { cells, .. } => cells.len(),
            HeapEntry::Object { .. } => unreachable!(),
        };
        Ok(match usize::try_from(idx).ok().filter(|i| *i < cells_len) {
            Some(i) => {
                self.record(in_bounds, true);
                if let HeapEntry::Array { cells, .. } = &mut self.heap[id] {
                    cells[i] = val;
                }
                None
            }
            None => {
                self.record(in_bounds, false);
                Some(Verdict::IndexOutOfBounds)
            }
        })
    }

    fn new_object(&mut self, class: &str) -> Self::Value {
        let id = self.heap.len();
        self.heap.push(HeapEntry::Object { class: class.to_string() });
        ConcolicVal::Ref(id)
    }

    fn get_field(&mut self, field: &str) -> Self::Value {
        if field == "$assertionsDisabled" {
            self.const_bool(false)
        } else {
            self.const_int(0)
        }
    }

    fn throw(&mut self, v: Self::Value) -> Result<Verdict, ImplError> {
        let id = match v {
            ConcolicVal::Ref(id) => id,
            _ => return Err(ImplError::TypeMismatch("throw of non-reference".into())),
        };
        match &self.heap[id] {
            HeapEntry::Object { class } => Ok(Verdict::from_exception_class(class)),
            HeapEntry::Array { .. } => Ok(Verdict::UnsupportedOperationException),
        }
    }

    fn print(&mut self, v: Self::Value) {
        self.output.push_str(&self.display(&v));
        self.output.push('\n');
    }

    fn display(&self, v: &Self::Value) -> String {
        match v {
            ConcolicVal::Int { concrete, .. } => concrete.to_string(),
            ConcolicVal::Bool { concrete, .. } => concrete.to_string(),
            ConcolicVal::Ref(id) => format!("ref#{}", id),
            ConcolicVal::Str(s) => s.clone(),
            ConcolicVal::Null => "null".to_string(),
            ConcolicVal::Void => String::new(),
        }
    }
}
