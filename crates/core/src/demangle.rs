//! Name demangling with an explicit memo.
//!
//! Demangling is pure but not free, and symbol names repeat across the
//! report layers, so callers that render many names share one
//! [`DemangleCache`]. The cache is an ordinary owned value passed in by
//! the caller; there is no process-wide state, which keeps tests isolated
//! and lets hosts wrap it in a lock if they parallelize rendering.

use std::collections::HashMap;

use rustc_demangle::try_demangle;

/// Caller-owned mangled-name -> demangled-name memo.
#[derive(Debug, Default)]
pub struct DemangleCache {
    entries: HashMap<String, String>,
}

impl DemangleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demangle a name, memoizing the result. Names the demangler does
    /// not recognize pass through unchanged (and are memoized as
    /// themselves, so repeated misses stay cheap).
    pub fn demangle(&mut self, mangled: &str) -> String {
        if let Some(hit) = self.entries.get(mangled) {
            return hit.clone();
        }
        let demangled = match try_demangle(mangled) {
            Ok(d) => d.to_string(),
            Err(_) => mangled.to_string(),
        };
        self.entries.insert(mangled.to_string(), demangled.clone());
        demangled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
