//! Concrete value semantics (§4.D): straightforward host-integer arithmetic,
//! heap-backed arrays and instances, and an injected output buffer for
//! `print`.

use crate::error::ImplError;
use crate::heap::{Heap, HeapObject};
use crate::instr::{BinOp, Condition, ElementType};
use crate::value::{Seed, Value};
use crate::verdict::Verdict;

use super::{Outcome, Semantics};

pub struct ConcreteSemantics {
    heap: Heap<Value>,
    output: String,
}

impl ConcreteSemantics {
    pub fn new() -> Self {
        Self {
            heap: Heap::new(),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn heap(&self) -> &Heap<Value> {
        &self.heap
    }

    /// Promotes host seed values into `Value`s, installing arrays on the
    /// heap and returning `Ref`s in their place (§4.A).
    pub fn wrap(&mut self, seeds: &[Seed]) -> Vec<Value> {
        seeds
            .iter()
            .map(|seed| match seed {
                Seed::Int(n) => Value::Int(*n),
                Seed::Bool(b) => Value::Bool(*b),
                Seed::IntArray(cells) => {
                    let cells = cells.iter().map(|n| Value::Int(*n)).collect();
                    let id = self.heap.alloc(HeapObject::Array {
                        element_type: ElementType::Int,
                        cells,
                    });
                    Value::Ref(id)
                }
            })
            .collect()
    }

    fn int(v: Value) -> Result<i32, ImplError> {
        v.as_i32().ok_or_else(|| ImplError::TypeMismatch("expected integral value".into()))
    }
}

impl Default for ConcreteSemantics {
    fn default() -> Self {
        Self::new()
    }
}

impl Semantics for ConcreteSemantics {
    type Value = Value;

    fn const_int(&mut self, n: i32) -> Value {
        Value::Int(n)
    }

    fn const_bool(&mut self, b: bool) -> Value {
        Value::Bool(b)
    }

    fn const_str(&mut self, s: &str) -> Value {
        Value::Str(s.to_string())
    }

    fn null(&mut self) -> Value {
        Value::Null
    }

    fn void(&mut self) -> Value {
        Value::Void
    }

    fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Result<Outcome<Value>, ImplError> {
        let (a, b) = (Self::int(lhs)?, Self::int(rhs)?);
        let result = match op {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div => {
                if b == 0 {
                    return Ok(Outcome::Exception(Verdict::ArithmeticException));
                }
                a.wrapping_div(b)
            }
        };
        Ok(Outcome::Value(Value::Int(result)))
    }

    fn negate(&mut self, v: Value) -> Result<Value, ImplError> {
        Ok(Value::Int(-Self::int(v)?))
    }

    fn incr(&mut self, v: Value, amount: i32) -> Result<Value, ImplError> {
        Ok(Value::Int(Self::int(v)?.wrapping_add(amount)))
    }

    fn compare(&mut self, cond: Condition, lhs: Value, rhs: Value) -> Result<bool, ImplError> {
        Ok(cond.eval(Self::int(lhs)?, Self::int(rhs)?))
    }

    fn compare_zero(&mut self, cond: Condition, v: Value) -> Result<bool, ImplError> {
        Ok(cond.eval(Self::int(v)?, 0))
    }

    fn new_array(&mut self, element_type: ElementType, length: Value) -> Result<Value, ImplError> {
        let len = Self::int(length)?.max(0) as usize;
        let cells = vec![Value::Int(0); len];
        let id = self.heap.alloc(HeapObject::Array { element_type, cells });
        Ok(Value::Ref(id))
    }

    fn array_length(&mut self, arr: Value) -> Result<Value, ImplError> {
        let id = arr.as_ref().ok_or_else(|| ImplError::TypeMismatch("expected array reference".into()))?;
        match self.heap.get(id) {
            HeapObject::Array { cells, .. } => Ok(Value::Int(cells.len() as i32)),
            HeapObject::ClassInstance { .. } => Err(ImplError::TypeMismatch("arraylength on class instance".into())),
        }
    }

    fn array_load(&mut self, arr: Value, index: Value) -> Result<Outcome<Value>, ImplError> {
        let id = arr.as_ref().ok_or_else(|| ImplError::TypeMismatch("expected array reference".into()))?;
        let idx = Self::int(index)?;
        match self.heap.get(id) {
            HeapObject::Array { cells, .. } => Ok(match usize::try_from(idx).ok().and_then(|i| cells.get(i)) {
                Some(v) => Outcome::Value(v.clone()),
                None => Outcome::Exception(Verdict::IndexOutOfBounds),
            }),
            HeapObject::ClassInstance { .. } => Err(ImplError::TypeMismatch("array_load on class instance".into())),
        }
    }

    fn array_store(&mut self, arr: Value, index: Value, value: Value) -> Result<Option<Verdict>, ImplError> {
        let id = arr.as_ref().ok_or_else(|| ImplError::TypeMismatch("expected array reference".into()))?;
        let idx = Self::int(index)?;
        match self.heap.get_mut(id) {
            HeapObject::Array { cells, .. } => {
                Ok(match usize::try_from(idx).ok().filter(|i| *i < cells.len()) {
                    Some(i) => {
                        cells[i] = value;
                        None
                    }
                    None => Some(Verdict::IndexOutOfBounds),
                })
            }
            HeapObject::ClassInstance { .. } => Err(ImplError::TypeMismatch("array_store on class instance".into())),
        }
    }

    fn new_object(&mut self, class: &str) -> Value {
        let id = self.heap.alloc(HeapObject::ClassInstance {
            class: class.to_string(),
            fields: Default::default(),
        });
        Value::Ref(id)
    }

    fn get_field(&mut self, field: &str) -> Value {
        if field == "$assertionsDisabled" {
            Value::Bool(false)
        } else {
            Value::Int(0)
        }
    }

    fn throw(&mut self, v: Value) -> Result<Verdict, ImplError> {
        let id = v.as_ref().ok_or_else(|| ImplError::TypeMismatch("throw of non-reference".into()))?;
        let class = self.heap.class_name(id).unwrap_or("").to_string();
        Ok(Verdict::from_exception_class(&class))
    }

    fn print(&mut self, v: Value) {
        self.output.push_str(&v.to_string());
        self.output.push('\n');
    }

    fn display(&self, v: &Value) -> String {
        v.to_string()
    }
}
