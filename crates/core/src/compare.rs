//! Whole-artifact comparison runner.
//!
//! Ties the layer engines together: byte identity first, then — only for
//! differing artifacts — the symbol, function, and string layers, and
//! finally the severity verdict. Every run recomputes from scratch; no
//! diff state survives between runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::function::{diff_function_maps, FunctionSetDiff};
use crate::model::ArtifactSnapshot;
use crate::normalize::Normalizer;
use crate::severity::{check_bit_equivalence, classify_severity, BitEquivalence, Severity};
use crate::strings::{diff_strings, StringDiff};
use crate::symbols::{diff_symbols, IgnoreSpec, PatternError, SymbolDiff};

/// Error type for comparison runs.
#[derive(Debug, Error)]
pub enum CompareError {
    /// A bad ignore pattern aborts the run before any layer diff is
    /// computed; a diff is never partially applied.
    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// Convenience result type for comparison runs.
pub type CompareResult<T> = Result<T, CompareError>;

fn default_context() -> usize {
    3
}

/// Caller-facing knobs for one comparison run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Keep only symbol/function names containing this substring.
    #[serde(default)]
    pub focus_prefix: Option<String>,
    /// Glob patterns for names to drop entirely (`*` any run, `?` one
    /// character, anchored).
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Keep linker-derived symbol annotations during normalization.
    #[serde(default)]
    pub keep_linker_symbols: bool,
    /// Context lines around each change when rendering hunks.
    #[serde(default = "default_context")]
    pub context: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            focus_prefix: None,
            ignore_patterns: Vec::new(),
            keep_linker_symbols: false,
            context: default_context(),
        }
    }
}

/// Aggregate result of one comparison run.
///
/// When the artifacts are bit-identical the layer diffs are never
/// computed and stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub old_name: String,
    pub new_name: String,
    pub bit: BitEquivalence,
    pub symbols: Option<SymbolDiff>,
    pub functions: Option<FunctionSetDiff>,
    pub strings: Option<StringDiff>,
    pub severity: Severity,
}

/// Compare two extracted snapshots.
///
/// The ignore patterns are compiled up front; a pattern error aborts the
/// run with no layer diff computed. Byte-identical artifacts
/// short-circuit to [`Severity::Identical`].
pub fn compare_snapshots(
    old: &ArtifactSnapshot,
    new: &ArtifactSnapshot,
    options: &CompareOptions,
    normalizer: &Normalizer,
) -> CompareResult<ComparisonReport> {
    let ignore = IgnoreSpec::compile(&options.ignore_patterns)?;

    let bit = check_bit_equivalence(&old.bytes, &new.bytes);
    if bit.identical {
        return Ok(ComparisonReport {
            old_name: old.name.clone(),
            new_name: new.name.clone(),
            bit,
            symbols: None,
            functions: None,
            strings: None,
            severity: Severity::Identical,
        });
    }

    let focus = options.focus_prefix.as_deref();
    let symbols = diff_symbols(&old.symbols, &new.symbols, focus, &ignore);

    // The focus/ignore filters apply to routines the same way they apply
    // to symbol names.
    let keep = |name: &str| focus.map_or(true, |f| name.contains(f)) && !ignore.matches(name);
    let old_functions = old
        .functions
        .iter()
        .filter(|(n, _)| keep(n.as_str()))
        .map(|(n, f)| (n.clone(), f.clone()))
        .collect();
    let new_functions = new
        .functions
        .iter()
        .filter(|(n, _)| keep(n.as_str()))
        .map(|(n, f)| (n.clone(), f.clone()))
        .collect();
    let functions = diff_function_maps(
        &old_functions,
        &new_functions,
        normalizer,
        options.keep_linker_symbols,
    );

    let strings = diff_strings(&old.strings, &new.strings);

    let severity = classify_severity(&bit, Some(&symbols), Some(&functions), Some(&strings));

    Ok(ComparisonReport {
        old_name: old.name.clone(),
        new_name: new.name.clone(),
        bit,
        symbols: Some(symbols),
        functions: Some(functions),
        strings: Some(strings),
        severity,
    })
}
