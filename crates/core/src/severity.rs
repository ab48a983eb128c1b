//! Whole-artifact bit equivalence and the aggregate severity verdict.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::function::FunctionSetDiff;
use crate::strings::StringDiff;
use crate::symbols::SymbolDiff;

/// Result of the byte-identity check.
///
/// `identical` is decided by hash equality alone; sizes are reported for
/// diagnostics but a size match proves nothing and a size mismatch is not
/// the criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitEquivalence {
    pub identical: bool,
    pub old_hash: String,
    pub new_hash: String,
    pub old_size: u64,
    pub new_size: u64,
}

/// Compare two artifacts byte-for-byte via SHA-256.
///
/// Both hashes are computed regardless of a size mismatch so reports can
/// always show them.
pub fn check_bit_equivalence(old_bytes: &[u8], new_bytes: &[u8]) -> BitEquivalence {
    let old_hash = sha256_hex(old_bytes);
    let new_hash = sha256_hex(new_bytes);
    BitEquivalence {
        identical: old_hash == new_hash,
        old_hash,
        new_hash,
        old_size: old_bytes.len() as u64,
        new_size: new_bytes.len() as u64,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Aggregate verdict over all comparison layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Identical,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Identical => "identical",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// How many added functions push a non-identical artifact past Low.
const MEDIUM_ADDED_FUNCTIONS: usize = 5;
/// How many modified functions push a non-identical artifact past Low.
const MEDIUM_MODIFIED_FUNCTIONS: usize = 10;

/// Classify the comparison outcome.
///
/// This is a fixed, deliberately coarse policy, not a scored metric:
/// bit-identical artifacts are `Identical` no matter what else was (or
/// was not) computed; any removed function is `High`; more than 5 added
/// or more than 10 modified functions is `Medium`; everything else —
/// including string-literal-only and unchanged-body differences — is
/// `Low`. The symbol and string layers are part of the interface but do
/// not move the verdict beyond that.
pub fn classify_severity(
    bit: &BitEquivalence,
    _symbols: Option<&SymbolDiff>,
    functions: Option<&FunctionSetDiff>,
    _strings: Option<&StringDiff>,
) -> Severity {
    if bit.identical {
        return Severity::Identical;
    }
    let Some(functions) = functions else {
        return Severity::Low;
    };
    if !functions.removed.is_empty() {
        Severity::High
    } else if functions.added.len() > MEDIUM_ADDED_FUNCTIONS
        || functions.modified.len() > MEDIUM_MODIFIED_FUNCTIONS
    {
        Severity::Medium
    } else {
        Severity::Low
    }
}
