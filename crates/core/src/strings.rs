//! String-literal set diffing.
//!
//! Literals are compared verbatim; no normalization applies at this
//! layer. Both listings deduplicate into sets before the comparison, so
//! repeated literals count once.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set difference/intersection of two string-literal listings.
///
/// All three buckets are sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub common: Vec<String>,
}

pub fn diff_strings(old: &[String], new: &[String]) -> StringDiff {
    let old_set: BTreeSet<&String> = old.iter().collect();
    let new_set: BTreeSet<&String> = new.iter().collect();

    StringDiff {
        added: new_set.difference(&old_set).map(|s| (*s).clone()).collect(),
        removed: old_set.difference(&new_set).map(|s| (*s).clone()).collect(),
        common: old_set.intersection(&new_set).map(|s| (*s).clone()).collect(),
    }
}
