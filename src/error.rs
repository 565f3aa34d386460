//! Implementation errors: the channel distinct from analysis-domain `Verdict`s.
//!
//! A `Verdict` (see [`crate::verdict`]) is a first-class outcome of analysis.
//! An `ImplError` means the analyzer itself could not make sense of its
//! input and aborts the call — a malformed descriptor, a type confusion
//! that should be unreachable for well-formed bytecode, or a call to a name
//! the class provider refuses to stub.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplError {
    /// `pc` ran past the end of the method, or a branch target does not
    /// name a decoded instruction.
    MalformedBytecode(String),
    /// An operation was applied to operands of the wrong kind (e.g.
    /// arithmetic on a `Ref`).
    TypeMismatch(String),
    /// A call target could not be resolved and stubbing was disabled.
    UnresolvedMethod { class: String, method: String },
}

impl fmt::Display for ImplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedBytecode(msg) => write!(f, "malformed bytecode: {}", msg),
            Self::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            Self::UnresolvedMethod { class, method } => {
                write!(f, "unresolved method: {}.{}", class, method)
            }
        }
    }
}

impl std::error::Error for ImplError {}
