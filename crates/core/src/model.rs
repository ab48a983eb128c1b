//! Data model for extracted artifact contents.
//!
//! These are the typed collections the diff engines consume: symbol
//! records, per-routine instruction lists, string-literal listings, and
//! the `ArtifactSnapshot` bundle the extraction layer produces. They are
//! plain value types; extraction owns how they are populated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classification of a symbol-table entry, following the classes the
/// common `nm`-style listings distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Data,
    Bss,
    ReadOnly,
    Common,
    Undefined,
    Weak,
    Absolute,
    Other,
}

/// Linkage binding of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolBinding {
    Global,
    Local,
    Weak,
    Unknown,
}

/// One entry from an artifact's symbol table.
///
/// Identity key is `name`; address/size/section are metadata that may be
/// absent depending on the artifact format and extraction tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub binding: SymbolBinding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// One disassembled instruction.
///
/// `mnemonic` and `operands` are the disassembler's text split at the
/// first whitespace run; `raw_line` preserves the original line for
/// display. Order within the owning routine is program order and is
/// significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: u64,
    pub raw_bytes: String,
    pub mnemonic: String,
    pub operands: String,
    pub raw_line: String,
}

impl Instruction {
    pub fn new(
        address: u64,
        raw_bytes: impl Into<String>,
        mnemonic: impl Into<String>,
        operands: impl Into<String>,
        raw_line: impl Into<String>,
    ) -> Self {
        Self {
            address,
            raw_bytes: raw_bytes.into(),
            mnemonic: mnemonic.into(),
            operands: operands.into(),
            raw_line: raw_line.into(),
        }
    }
}

/// A routine with its ordered instruction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisassembledFunction {
    pub name: String,
    pub start_address: u64,
    pub instructions: Vec<Instruction>,
}

impl DisassembledFunction {
    pub fn new(name: impl Into<String>, start_address: u64) -> Self {
        Self { name: name.into(), start_address, instructions: Vec::new() }
    }
}

/// Per-artifact routine mapping. Names are assumed unique per artifact;
/// duplicate names collapse to last-seen on insert.
pub type FunctionMap = BTreeMap<String, DisassembledFunction>;

/// Build a [`FunctionMap`] from a listing, collapsing duplicate names to
/// the last-seen definition.
pub fn function_map(functions: Vec<DisassembledFunction>) -> FunctionMap {
    let mut map = FunctionMap::new();
    for func in functions {
        map.insert(func.name.clone(), func);
    }
    map
}

/// Everything the extraction layer produces for one artifact: the raw
/// bytes plus the parsed symbol table, routine bodies, and string
/// literals. The diff engines consume this and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSnapshot {
    /// Display name, typically the file name.
    pub name: String,
    /// Raw file contents, used for the bit-equivalence check.
    pub bytes: Vec<u8>,
    pub symbols: Vec<Symbol>,
    pub functions: FunctionMap,
    pub strings: Vec<String>,
}

impl ArtifactSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: Vec::new(),
            symbols: Vec::new(),
            functions: FunctionMap::new(),
            strings: Vec::new(),
        }
    }
}
