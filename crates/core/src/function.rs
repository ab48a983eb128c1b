//! Per-routine body diffing and the function-set partition.
//!
//! Each routine is normalized into a key sequence (see
//! [`crate::normalize`]) and diffed line-by-line (see
//! [`crate::sequence`]). On top of that this module provides the
//! order-preserving body digest used as the Identical fast path, the
//! set-based semantic-change signals, context-windowed hunks for
//! unified-diff rendering, and the partition of two function maps into
//! identical/modified/added/removed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{DisassembledFunction, FunctionMap};
use crate::normalize::Normalizer;
use crate::sequence::{diff_sequences, DiffLine};

/// Line counts for one routine diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionDiffStats {
    pub total_old: usize,
    pub total_new: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Full line-level diff of one routine plus derived counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDiffResult {
    pub lines: Vec<DiffLine>,
    pub stats: FunctionDiffStats,
}

/// Set-based approximation of what changed in a routine body.
///
/// Computed over *sets* of normalized keys, so pure reordering is
/// invisible here. These flags feed supplementary signals only; the
/// Identical/Modified verdict always comes from the ordered comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SemanticChange {
    /// Any key present on one side only.
    pub any: bool,
    /// Some differing key is a control-flow mnemonic.
    pub control_flow: bool,
    /// Some differing key is a call mnemonic.
    pub calls: bool,
}

/// A contiguous context-padded window of a routine diff.
///
/// Carries enough position data to render a unified-diff header without
/// further computation: `old_start`/`new_start` are 1-based line numbers
/// into the respective sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// Normalize every instruction of a routine into its key sequence.
pub fn normalized_keys(
    func: &DisassembledFunction,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> Vec<String> {
    func.instructions.iter().map(|ins| normalizer.normalize(ins, keep_linker_symbols)).collect()
}

/// Order-preserving digest of a routine's normalized key sequence.
///
/// Keys are fed through SHA-256 with a length prefix per key, so the
/// digest distinguishes reorderings and boundary shifts (this is a
/// content hash of the sequence, not a set hash).
pub fn body_digest(
    func: &DisassembledFunction,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> String {
    let mut hasher = Sha256::new();
    for key in normalized_keys(func, normalizer, keep_linker_symbols) {
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Fast path: equal digests imply the bodies are identical under
/// normalization. Unequal digests say nothing beyond "not identical";
/// classification and the edit script require [`diff_function`].
pub fn body_equals(
    old: &DisassembledFunction,
    new: &DisassembledFunction,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> bool {
    body_digest(old, normalizer, keep_linker_symbols)
        == body_digest(new, normalizer, keep_linker_symbols)
}

/// Line-level diff of two routine bodies with derived counts.
pub fn diff_function(
    old: &DisassembledFunction,
    new: &DisassembledFunction,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> FunctionDiffResult {
    let old_keys = normalized_keys(old, normalizer, keep_linker_symbols);
    let new_keys = normalized_keys(new, normalizer, keep_linker_symbols);
    let lines = diff_sequences(&old_keys, &new_keys);

    let mut stats = FunctionDiffStats {
        total_old: old_keys.len(),
        total_new: new_keys.len(),
        ..Default::default()
    };
    for line in &lines {
        match line {
            DiffLine::Context(_) => stats.unchanged += 1,
            DiffLine::Removed(_) => stats.removed += 1,
            DiffLine::Added(_) => stats.added += 1,
        }
    }

    FunctionDiffResult { lines, stats }
}

/// Set-based added/removed detection over normalized keys.
///
/// Misses pure reordering by construction; use only for the
/// changed-control-flow / changed-calls signals.
pub fn semantic_change(
    old: &DisassembledFunction,
    new: &DisassembledFunction,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> SemanticChange {
    let old_set: BTreeSet<String> =
        normalized_keys(old, normalizer, keep_linker_symbols).into_iter().collect();
    let new_set: BTreeSet<String> =
        normalized_keys(new, normalizer, keep_linker_symbols).into_iter().collect();

    let mut change = SemanticChange::default();
    for key in old_set.symmetric_difference(&new_set) {
        change.any = true;
        let mnemonic = key.split_whitespace().next().unwrap_or("");
        if normalizer.is_control_flow(mnemonic) {
            change.control_flow = true;
        }
        if normalizer.is_call(mnemonic) {
            change.calls = true;
        }
    }
    change
}

/// Window a tagged line sequence into context-padded hunks.
///
/// Every Added/Removed index is expanded by `context` positions on both
/// sides (clamped to the sequence bounds); expanded ranges separated by a
/// gap of at most one untouched index merge into one hunk. Hunks are
/// emitted in original order and never merge across a wider gap.
pub fn build_hunks(lines: &[DiffLine], context: usize) -> Vec<Hunk> {
    let changed: Vec<usize> =
        lines.iter().enumerate().filter(|(_, l)| l.is_change()).map(|(i, _)| i).collect();
    if changed.is_empty() {
        return Vec::new();
    }

    // Expand and merge index ranges. Two expanded ranges stay one hunk
    // unless more than one untouched index lies between them.
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &idx in &changed {
        let start = idx.saturating_sub(context);
        let end = (idx + context).min(lines.len() - 1);
        match ranges.last_mut() {
            Some((_, prev_end)) if start <= *prev_end + 2 => *prev_end = (*prev_end).max(end),
            _ => ranges.push((start, end)),
        }
    }

    // Walk the full sequence once, tracking per-side line numbers.
    let mut hunks = Vec::with_capacity(ranges.len());
    let mut old_line = 1usize;
    let mut new_line = 1usize;
    let mut range_iter = ranges.into_iter();
    let mut current = range_iter.next();
    for (idx, line) in lines.iter().enumerate() {
        if let Some((start, end)) = current {
            if idx == start {
                hunks.push(Hunk {
                    old_start: old_line,
                    old_count: 0,
                    new_start: new_line,
                    new_count: 0,
                    lines: Vec::with_capacity(end - start + 1),
                });
            }
            if idx >= start && idx <= end {
                let hunk = hunks.last_mut().unwrap();
                match line {
                    DiffLine::Context(_) => {
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    DiffLine::Removed(_) => hunk.old_count += 1,
                    DiffLine::Added(_) => hunk.new_count += 1,
                }
                hunk.lines.push(line.clone());
            }
            if idx == end {
                current = range_iter.next();
            }
        }
        match line {
            DiffLine::Context(_) => {
                old_line += 1;
                new_line += 1;
            }
            DiffLine::Removed(_) => old_line += 1,
            DiffLine::Added(_) => new_line += 1,
        }
    }
    hunks
}

/// Summary entry for one routine whose body changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedFunction {
    pub name: String,
    pub stats: FunctionDiffStats,
    pub control_flow_changed: bool,
    pub calls_changed: bool,
}

/// Partition of two function maps.
///
/// Every name in the union of the two maps lands in exactly one bucket;
/// all buckets are name-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionSetDiff {
    pub identical: Vec<String>,
    pub modified: Vec<ModifiedFunction>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Compare two per-artifact function maps.
///
/// Common names take the digest fast path first; only digest mismatches
/// pay for the full line diff. Per-routine comparisons are independent of
/// each other, so hosts may parallelize across names if they choose.
pub fn diff_function_maps(
    old: &FunctionMap,
    new: &FunctionMap,
    normalizer: &Normalizer,
    keep_linker_symbols: bool,
) -> FunctionSetDiff {
    let mut diff = FunctionSetDiff::default();

    for (name, old_fn) in old {
        match new.get(name) {
            None => diff.removed.push(name.clone()),
            Some(new_fn) => {
                if body_equals(old_fn, new_fn, normalizer, keep_linker_symbols) {
                    diff.identical.push(name.clone());
                } else {
                    let result = diff_function(old_fn, new_fn, normalizer, keep_linker_symbols);
                    let change = semantic_change(old_fn, new_fn, normalizer, keep_linker_symbols);
                    diff.modified.push(ModifiedFunction {
                        name: name.clone(),
                        stats: result.stats,
                        control_flow_changed: change.control_flow,
                        calls_changed: change.calls,
                    });
                }
            }
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            diff.added.push(name.clone());
        }
    }

    // BTreeMap iteration is already name-ordered; keep the contract
    // explicit for the Vec buckets anyway.
    diff.identical.sort();
    diff.modified.sort_by(|a, b| a.name.cmp(&b.name));
    diff.added.sort();
    diff.removed.sort();
    diff
}
