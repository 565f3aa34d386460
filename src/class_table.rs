//! In-memory method lookup (§4.I) and the descriptor → decoded-method
//! pipeline. Building and filling a `ClassTable` from files on disk is the
//! external loader's job; this module only owns the table once populated
//! (by a caller, or by [`ClassTable::from_descriptor_json`] for an
//! in-memory descriptor blob).

use std::collections::HashMap;

use crate::descriptor::{RawDescriptorFile, RawType};
use crate::error::ImplError;
use crate::instr::{decode, Instruction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Bool,
    IntArray,
    Other,
}

fn param_kind(ty: &RawType) -> ParamKind {
    match ty {
        RawType::Base { base } => match base.as_str() {
            "bool" | "boolean" => ParamKind::Bool,
            "int" | "byte" | "short" | "char" => ParamKind::Int,
            _ => ParamKind::Other,
        },
        RawType::Array { elem, .. } => match param_kind(elem) {
            ParamKind::Int => ParamKind::IntArray,
            _ => ParamKind::Other,
        },
        RawType::Class { .. } => ParamKind::Other,
    }
}

#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamKind>,
    pub returns: bool,
    pub instructions: Vec<Instruction>,
    pub locals_count: usize,
}

impl MethodDescriptor {
    fn locals_count_for(params: usize, instructions: &[Instruction]) -> usize {
        let mut max_slot = params.saturating_sub(1);
        for instr in instructions {
            let idx = match instr {
                Instruction::Load(i) | Instruction::Store(i) => Some(*i),
                Instruction::Incr { index, .. } => Some(*index),
                _ => None,
            };
            if let Some(idx) = idx {
                max_slot = max_slot.max(idx);
            }
        }
        max_slot + 1
    }
}

/// Owns every parsed method by `(class, method)` in one immutable table
/// (§9: no ownership cycles, since callees are referenced by name).
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: HashMap<String, HashMap<String, MethodDescriptor>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&mut self, class: impl Into<String>, methods: Vec<MethodDescriptor>) {
        let entry = self.classes.entry(class.into()).or_default();
        for m in methods {
            entry.insert(m.name.clone(), m);
        }
    }

    /// Parses one descriptor file's bytes (already in memory — no file I/O
    /// here) into a `ClassTable` (§4.H).
    pub fn from_descriptor_json(text: &str) -> Result<Self, ImplError> {
        let file: RawDescriptorFile = serde_json::from_str(text)
            .map_err(|e| ImplError::MalformedBytecode(format!("descriptor JSON: {}", e)))?;
        let mut table = Self::new();
        for class in file.into_classes() {
            let mut methods = Vec::with_capacity(class.methods.len());
            for raw_method in class.methods {
                let instructions = decode(&raw_method.code.bytecode)?;
                let params: Vec<ParamKind> = raw_method.params.iter().map(param_kind).collect();
                let locals_count = MethodDescriptor::locals_count_for(params.len(), &instructions);
                methods.push(MethodDescriptor {
                    name: raw_method.name,
                    params,
                    returns: raw_method.returns.is_some(),
                    instructions,
                    locals_count,
                });
            }
            table.insert_class(class.name, methods);
        }
        Ok(table)
    }

    pub fn method(&self, class: &str, method: &str) -> Option<&MethodDescriptor> {
        self.classes.get(class)?.get(method)
    }
}

/// What the Dispatcher resolves `invoke` targets through (§4.I). Unknown
/// names are not an error: they yield a stub.
pub trait ClassProvider {
    fn method(&self, class: &str, method: &str) -> Resolution<'_>;
}

pub enum Resolution<'a> {
    Known(&'a MethodDescriptor),
    /// The println-style stream's print method (§4.C): modeled as a
    /// synthetic one-instruction method, recognized by name rather than
    /// looked up in the table.
    PrintStub,
    /// Any other unresolved target: a synthetic stub returning `Int 0`.
    Stub,
}

const PRINT_CLASSES: &[&str] = &["java/io/PrintStream", "System.out", "System.err"];
const PRINT_METHODS: &[&str] = &["println", "print"];

impl ClassProvider for ClassTable {
    fn method(&self, class: &str, method: &str) -> Resolution<'_> {
        if let Some(m) = self.method(class, method) {
            return Resolution::Known(m);
        }
        if PRINT_CLASSES.contains(&class) && PRINT_METHODS.contains(&method) {
            return Resolution::PrintStub;
        }
        Resolution::Stub
    }
}
