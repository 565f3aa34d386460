//! Record types mirroring the external decompiler's JSON shape (§6).
//!
//! These are pure data: deserializing them is in scope (the interpreter
//! must be able to accept one descriptor file's bytes handed to it by a
//! caller), but walking a directory of such files to find them is the
//! file-scanning harness's job, which lives outside this crate.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawType {
    Array {
        kind: String,
        #[serde(rename = "type")]
        elem: Box<RawType>,
    },
    Class {
        kind: String,
        name: String,
    },
    Base {
        base: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLiteral {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<RawType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMethodRef {
    #[serde(rename = "ref")]
    pub r: Option<RawClassRef>,
    pub name: String,
    #[serde(default)]
    pub args: Vec<RawType>,
    pub returns: Option<RawType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawClassRef {
    pub name: String,
}

/// A single tagged bytecode record. Every field besides `opr`/`offset` is
/// optional because which ones are present depends on `opr` — the same
/// shape the decompiler emits and the same shape the decoder (§4.B)
/// switches on.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOp {
    pub opr: String,
    pub offset: i64,
    #[serde(rename = "type")]
    pub ty: Option<RawType>,
    pub index: Option<i64>,
    pub operant: Option<String>,
    pub value: Option<RawLiteral>,
    pub condition: Option<String>,
    pub target: Option<i64>,
    pub amount: Option<i64>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub field: Option<RawField>,
    pub method: Option<RawMethodRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCode {
    pub bytecode: Vec<RawOp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMethod {
    pub name: String,
    #[serde(default)]
    pub params: Vec<RawType>,
    pub returns: Option<RawType>,
    pub code: RawCode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawClass {
    pub name: String,
    pub methods: Vec<RawMethod>,
}

/// A descriptor file holds one class or a list of classes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDescriptorFile {
    One(RawClass),
    Many(Vec<RawClass>),
}

impl RawDescriptorFile {
    pub fn into_classes(self) -> Vec<RawClass> {
        match self {
            Self::One(c) => vec![c],
            Self::Many(cs) => cs,
        }
    }
}
