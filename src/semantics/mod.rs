//! The `Semantics` capability trait the generic [`crate::dispatcher::Dispatcher`]
//! is parameterized over, plus the two plug-ins that share it: concrete
//! (§4.D) and concolic (§4.F). The sign-lattice semantics (§4.E) is a
//! worklist-based fixpoint over a fundamentally different control-flow
//! shape — a single step can fork into several successor states — so it
//! does not implement this trait; see `semantics::sign` for why, and for
//! how it still reuses `Instruction`/`Frame`.

pub mod concolic;
pub mod concrete;
pub mod sign;

use crate::error::ImplError;
use crate::instr::{BinOp, Condition, ElementType};
use crate::verdict::Verdict;

/// The result of a binary/array operation that might instead terminate the
/// path with a domain exception.
pub enum Outcome<V> {
    Value(V),
    Exception(Verdict),
}

/// Capabilities the dispatcher needs from a *deterministic, single-path*
/// value semantics. Both the concrete and concolic engines implement this;
/// the dispatcher's step loop (§4.C) is identical for both, differing only
/// in what each method does internally (the concolic semantics additionally
/// records a path condition as a side effect).
pub trait Semantics {
    type Value: Clone;

    fn const_int(&mut self, n: i32) -> Self::Value;
    fn const_bool(&mut self, b: bool) -> Self::Value;
    fn const_str(&mut self, s: &str) -> Self::Value;
    fn null(&mut self) -> Self::Value;
    fn void(&mut self) -> Self::Value;

    /// Every method below that can observe a value of the wrong kind
    /// surfaces that as `Err(ImplError::TypeMismatch)` rather than
    /// panicking (§7: implementation errors abort the analysis call with a
    /// surfaced `Result::Err`, distinct from a domain `Verdict`).
    fn binary(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value) -> Result<Outcome<Self::Value>, ImplError>;
    fn negate(&mut self, v: Self::Value) -> Result<Self::Value, ImplError>;
    fn incr(&mut self, v: Self::Value, amount: i32) -> Result<Self::Value, ImplError>;

    /// Evaluates a two-operand comparison and returns whether to take the
    /// branch. For concolic this also appends the condition (or its
    /// negation) to the path condition.
    fn compare(&mut self, cond: Condition, lhs: Self::Value, rhs: Self::Value) -> Result<bool, ImplError>;
    /// As `compare`, against an implicit zero right-hand side.
    fn compare_zero(&mut self, cond: Condition, v: Self::Value) -> Result<bool, ImplError>;

    fn new_array(&mut self, element_type: ElementType, length: Self::Value) -> Result<Self::Value, ImplError>;
    fn array_length(&mut self, arr: Self::Value) -> Result<Self::Value, ImplError>;
    fn array_load(&mut self, arr: Self::Value, index: Self::Value) -> Result<Outcome<Self::Value>, ImplError>;
    fn array_store(&mut self, arr: Self::Value, index: Self::Value, value: Self::Value) -> Result<Option<Verdict>, ImplError>;

    fn new_object(&mut self, class: &str) -> Self::Value;
    fn get_field(&mut self, field: &str) -> Self::Value;
    /// Looks up the thrown reference's class and yields its verdict kind.
    fn throw(&mut self, v: Self::Value) -> Result<Verdict, ImplError>;

    fn print(&mut self, v: Self::Value);
    fn display(&self, v: &Self::Value) -> String;
}
