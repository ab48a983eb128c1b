//! Symbol-table diffing.
//!
//! Map-based comparison of two symbol collections: names only on one side
//! become added/removed, common names are compared attribute by attribute
//! (kind, binding, size, section) and routed to changed or unchanged. A
//! focus prefix narrows both sides to matching names; an ignore list of
//! glob patterns drops noise symbols (unwind tables, linker-generated
//! labels) before the partition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Symbol;

/// Error type for ignore-pattern compilation.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The supported dialect is `*`, `?`, and literal characters only.
    /// Bracket classes from richer glob dialects are rejected up front so
    /// they cannot silently match as literals.
    #[error("Unsupported glob construct {construct:?} in pattern {pattern:?}")]
    UnsupportedConstruct { pattern: String, construct: char },

    /// Empty patterns are almost always a caller bug (an empty pattern
    /// matches only the empty name), so they are rejected explicitly.
    #[error("Empty ignore pattern")]
    Empty,
}

/// One element of a compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GlobToken {
    Literal(char),
    AnyRun,
    AnyChar,
}

/// An anchored glob pattern: `*` matches any run of characters, `?` any
/// single character, everything else itself. Matching always covers the
/// whole name; this is not a substring search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    tokens: Vec<GlobToken>,
}

impl GlobPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let mut tokens = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            match c {
                '*' => tokens.push(GlobToken::AnyRun),
                '?' => tokens.push(GlobToken::AnyChar),
                '[' | ']' => {
                    return Err(PatternError::UnsupportedConstruct {
                        pattern: pattern.to_string(),
                        construct: c,
                    })
                }
                other => tokens.push(GlobToken::Literal(other)),
            }
        }
        Ok(Self { source: pattern.to_string(), tokens })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Anchored full-string match.
    pub fn matches(&self, name: &str) -> bool {
        let chars: Vec<char> = name.chars().collect();
        // Iterative matcher with star backtracking: on mismatch past a
        // `*`, re-expand the star by one character and retry.
        let mut t = 0usize;
        let mut c = 0usize;
        let mut star: Option<(usize, usize)> = None;
        while c < chars.len() {
            match self.tokens.get(t) {
                Some(GlobToken::Literal(l)) if *l == chars[c] => {
                    t += 1;
                    c += 1;
                }
                Some(GlobToken::AnyChar) => {
                    t += 1;
                    c += 1;
                }
                Some(GlobToken::AnyRun) => {
                    star = Some((t, c));
                    t += 1;
                }
                _ => match star {
                    Some((st, sc)) => {
                        t = st + 1;
                        c = sc + 1;
                        star = Some((st, sc + 1));
                    }
                    None => return false,
                },
            }
        }
        while matches!(self.tokens.get(t), Some(GlobToken::AnyRun)) {
            t += 1;
        }
        t == self.tokens.len()
    }
}

/// A compiled set of ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSpec {
    patterns: Vec<GlobPattern>,
}

impl IgnoreSpec {
    /// Compile a pattern list. Fails on the first bad pattern; a diff is
    /// never run against a partially compiled ignore list.
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| GlobPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// A common symbol whose attributes differ between the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolChange {
    pub name: String,
    pub old: Symbol,
    pub new: Symbol,
    /// Human-readable descriptions, one per differing attribute.
    pub changes: Vec<String>,
}

/// Partition of two symbol collections.
///
/// Every name in the union of the filtered old and new sets lands in
/// exactly one bucket; all buckets are name-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SymbolDiff {
    pub added: Vec<Symbol>,
    pub removed: Vec<Symbol>,
    pub changed: Vec<SymbolChange>,
    pub unchanged: Vec<Symbol>,
}

/// Compare two symbol collections.
///
/// `focus_prefix` keeps only names containing the given substring (both
/// sides); `ignore` then drops matching names. Duplicate names collapse
/// last-wins into the per-side maps before partitioning.
pub fn diff_symbols(
    old: &[Symbol],
    new: &[Symbol],
    focus_prefix: Option<&str>,
    ignore: &IgnoreSpec,
) -> SymbolDiff {
    let keep = |name: &str| {
        focus_prefix.map_or(true, |f| name.contains(f)) && !ignore.matches(name)
    };

    let index = |symbols: &[Symbol]| -> BTreeMap<String, Symbol> {
        symbols
            .iter()
            .filter(|s| keep(&s.name))
            .map(|s| (s.name.clone(), s.clone()))
            .collect()
    };
    let old_map = index(old);
    let new_map = index(new);

    let mut diff = SymbolDiff::default();
    for (name, old_sym) in &old_map {
        match new_map.get(name) {
            None => diff.removed.push(old_sym.clone()),
            Some(new_sym) => {
                let changes = describe_changes(old_sym, new_sym);
                if changes.is_empty() {
                    diff.unchanged.push(new_sym.clone());
                } else {
                    diff.changed.push(SymbolChange {
                        name: name.clone(),
                        old: old_sym.clone(),
                        new: new_sym.clone(),
                        changes,
                    });
                }
            }
        }
    }
    for (name, new_sym) in &new_map {
        if !old_map.contains_key(name) {
            diff.added.push(new_sym.clone());
        }
    }

    diff.added.sort_by(|a, b| a.name.cmp(&b.name));
    diff.removed.sort_by(|a, b| a.name.cmp(&b.name));
    diff.changed.sort_by(|a, b| a.name.cmp(&b.name));
    diff.unchanged.sort_by(|a, b| a.name.cmp(&b.name));
    diff
}

/// Attribute comparison for a common name.
///
/// Size and section only count when both sides report them; addresses are
/// layout, never compared.
fn describe_changes(old: &Symbol, new: &Symbol) -> Vec<String> {
    let mut changes = Vec::new();
    if old.kind != new.kind {
        changes.push(format!("kind: {:?} -> {:?}", old.kind, new.kind));
    }
    if old.binding != new.binding {
        changes.push(format!("binding: {:?} -> {:?}", old.binding, new.binding));
    }
    if let (Some(old_size), Some(new_size)) = (old.size, new.size) {
        if old_size != new_size {
            changes.push(format!("size: {old_size} -> {new_size}"));
        }
    }
    if let (Some(old_sec), Some(new_sec)) = (&old.section, &new.section) {
        if old_sec != new_sec {
            changes.push(format!("section: {old_sec} -> {new_sec}"));
        }
    }
    changes
}
