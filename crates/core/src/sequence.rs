//! Generic sequence diffing over comparison keys.
//!
//! This is the minimal-edit layer underneath the function diff: a classic
//! longest-common-subsequence diff over two ordered key sequences,
//! producing one tagged line per element of the merged sequence.

use serde::{Deserialize, Serialize};

/// One line of a computed diff.
///
/// Closed sum type so consumers can match exhaustively; the compiler
/// flags every new consumer that forgets a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "key", rename_all = "snake_case")]
pub enum DiffLine {
    /// Present on both sides; part of the common subsequence.
    Context(String),
    /// Present only on the old side.
    Removed(String),
    /// Present only on the new side.
    Added(String),
}

impl DiffLine {
    pub fn key(&self) -> &str {
        match self {
            DiffLine::Context(k) | DiffLine::Removed(k) | DiffLine::Added(k) => k,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffLine::Context(_))
    }
}

/// Diff two ordered key sequences via LCS.
///
/// Classic O(m·n) dynamic programming over prefix LCS lengths, then a
/// backtrack from the full lengths: equal elements emit [`DiffLine::Context`],
/// otherwise the step that preserves the LCS length emits
/// [`DiffLine::Removed`] (old side) or [`DiffLine::Added`] (new side).
///
/// Tie-break, fixed on purpose: at a substitution boundary (both steps
/// preserve the LCS length) the new element is consumed first, so the
/// Added line precedes the Removed line in the output. Changing this
/// shifts which exact line is flagged at ambiguous boundaries without
/// changing aggregate counts.
///
/// Guarantees:
/// - the Context lines, in order, are exactly the LCS;
/// - every old element outside the LCS appears exactly once as Removed;
/// - every new element outside the LCS appears exactly once as Added;
/// - the relative order of old elements and of new elements is preserved.
///
/// The quadratic table is fine for per-routine instruction counts (tens
/// to low thousands) but makes this unsuitable for diffing a whole binary
/// as one sequence.
pub fn diff_sequences(old: &[String], new: &[String]) -> Vec<DiffLine> {
    let m = old.len();
    let n = new.len();

    // lcs[i][j] = length of the LCS of old[..i] and new[..j].
    let mut lcs = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            lcs[i][j] = if old[i - 1] == new[j - 1] {
                lcs[i - 1][j - 1] + 1
            } else {
                lcs[i - 1][j].max(lcs[i][j - 1])
            };
        }
    }

    let mut lines = Vec::with_capacity(m.max(n));
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
            lines.push(DiffLine::Context(old[i - 1].clone()));
            i -= 1;
            j -= 1;
        } else if i > 0 && (j == 0 || lcs[i - 1][j] >= lcs[i][j - 1]) {
            // >= favors stepping the old side here; after the reversal
            // below that puts the Added line first at a substitution.
            lines.push(DiffLine::Removed(old[i - 1].clone()));
            i -= 1;
        } else {
            lines.push(DiffLine::Added(new[j - 1].clone()));
            j -= 1;
        }
    }
    lines.reverse();
    lines
}
