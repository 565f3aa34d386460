//! The decoded instruction ADT (§3) and the decoder that projects raw
//! descriptor records (§6) into it (§4.B).

use std::collections::HashMap;

use crate::descriptor::{RawOp, RawType};
use crate::error::ImplError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Condition {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            _ => return None,
        })
    }

    /// Evaluates the condition on a representative pair of host integers.
    /// Used directly by the concrete semantics and, case-by-case over sign
    /// representatives, by the sign-lattice semantics.
    pub fn eval(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int,
    Bool,
    Byte,
    Short,
}

impl ElementType {
    fn parse(ty: &RawType) -> Self {
        match ty {
            RawType::Base { base } => match base.as_str() {
                "bool" | "boolean" => Self::Bool,
                "byte" => Self::Byte,
                "short" => Self::Short,
                _ => Self::Int,
            },
            _ => Self::Int,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i32),
    Bool(bool),
    /// A string constant, e.g. the argument to `println`. Not part of the
    /// JVM-shaped `Value` arithmetic domain — only `print` ever consumes one.
    Str(String),
}

/// One decoded instruction. Position within a method's `Vec<Instruction>`
/// is the `pc`; `Jump`/`If`/`Ifz`/`Goto` targets are resolved at decode
/// time to indices into that same vector, not raw source offsets.
#[derive(Debug, Clone)]
pub enum Instruction {
    Push(Literal),
    Load(usize),
    Store(usize),
    Dup,
    Pop,
    Incr { index: usize, amount: i32 },
    Binary(BinOp),
    Negate,
    If(Condition, usize),
    Ifz(Condition, usize),
    Goto(usize),
    /// `true` when the method returns a value (non-void).
    Return(bool),
    New(String),
    NewArray(ElementType),
    ArrayLength,
    ArrayLoad,
    ArrayStore,
    Get(String),
    Invoke {
        class: String,
        method: String,
        arity: usize,
        returns: bool,
    },
    Throw,
    Print,
}

fn require<T>(opt: Option<T>, field: &str, opr: &str) -> Result<T, ImplError> {
    opt.ok_or_else(|| ImplError::MalformedBytecode(format!("`{}` missing `{}`", opr, field)))
}

/// Decodes a raw bytecode stream into the typed `Instruction` ADT,
/// resolving every branch target from source offset to vector index.
pub fn decode(raw: &[RawOp]) -> Result<Vec<Instruction>, ImplError> {
    let mut offset_to_index = HashMap::with_capacity(raw.len());
    for (idx, op) in raw.iter().enumerate() {
        offset_to_index.insert(op.offset, idx);
    }
    let resolve = |target: i64, opr: &str| -> Result<usize, ImplError> {
        offset_to_index.get(&target).copied().ok_or_else(|| {
            ImplError::MalformedBytecode(format!("`{}` target offset {} not found", opr, target))
        })
    };

    raw.iter()
        .map(|op| decode_one(op, &resolve))
        .collect()
}

fn decode_one(
    op: &RawOp,
    resolve: &impl Fn(i64, &str) -> Result<usize, ImplError>,
) -> Result<Instruction, ImplError> {
    let opr = op.opr.as_str();
    match opr {
        "push" => {
            let lit = require(op.value.as_ref(), "value", opr)?;
            let literal = match lit.ty.as_str() {
                "boolean" | "bool" => Literal::Bool(lit.value.as_bool().unwrap_or(false)),
                "string" | "String" => Literal::Str(
                    lit.value
                        .as_str()
                        .ok_or_else(|| ImplError::MalformedBytecode("push value not a string".into()))?
                        .to_string(),
                ),
                _ => Literal::Int(
                    lit.value
                        .as_i64()
                        .ok_or_else(|| ImplError::MalformedBytecode("push value not an integer".into()))?
                        as i32,
                ),
            };
            Ok(Instruction::Push(literal))
        }
        "load" => Ok(Instruction::Load(require(op.index, "index", opr)? as usize)),
        "store" => Ok(Instruction::Store(require(op.index, "index", opr)? as usize)),
        "dup" => Ok(Instruction::Dup),
        "pop" => Ok(Instruction::Pop),
        "incr" => Ok(Instruction::Incr {
            index: require(op.index, "index", opr)? as usize,
            amount: require(op.amount, "amount", opr)? as i32,
        }),
        "binary" => {
            let operant = require(op.operant.as_deref(), "operant", opr)?;
            let bin = match operant {
                "add" => BinOp::Add,
                "sub" => BinOp::Sub,
                "mul" => BinOp::Mul,
                "div" => BinOp::Div,
                other => {
                    return Err(ImplError::MalformedBytecode(format!(
                        "unknown binary operant `{}`",
                        other
                    )))
                }
            };
            Ok(Instruction::Binary(bin))
        }
        "negate" => Ok(Instruction::Negate),
        "if" | "ifz" => {
            let cond_str = require(op.condition.as_deref(), "condition", opr)?;
            let cond = Condition::parse(cond_str).ok_or_else(|| {
                ImplError::MalformedBytecode(format!("unknown condition `{}`", cond_str))
            })?;
            let target = resolve(require(op.target, "target", opr)?, opr)?;
            if opr == "if" {
                Ok(Instruction::If(cond, target))
            } else {
                Ok(Instruction::Ifz(cond, target))
            }
        }
        "goto" => {
            let target = resolve(require(op.target, "target", opr)?, opr)?;
            Ok(Instruction::Goto(target))
        }
        "return" => Ok(Instruction::Return(op.ty.is_some())),
        "new" => Ok(Instruction::New(require(op.class_name.clone(), "class", opr)?)),
        "newarray" => {
            let ty = require(op.ty.as_ref(), "type", opr)?;
            Ok(Instruction::NewArray(ElementType::parse(ty)))
        }
        "arraylength" => Ok(Instruction::ArrayLength),
        "array_load" => Ok(Instruction::ArrayLoad),
        "array_store" => Ok(Instruction::ArrayStore),
        "get" => {
            let field = require(op.field.as_ref(), "field", opr)?;
            Ok(Instruction::Get(field.name.clone()))
        }
        "invoke" => {
            let method = require(op.method.as_ref(), "method", opr)?;
            let class = method
                .r
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_default();
            Ok(Instruction::Invoke {
                class,
                method: method.name.clone(),
                arity: method.args.len(),
                returns: method.returns.is_some(),
            })
        }
        "throw" => Ok(Instruction::Throw),
        "print" => Ok(Instruction::Print),
        other => Err(ImplError::MalformedBytecode(format!(
            "unknown instruction tag `{}`",
            other
        ))),
    }
}
