//! Helpers shared by the binparity CLI: profile loading, file hashing,
//! and plain-text report rendering.
//!
//! Rendering returns strings rather than printing so the exact output
//! can be unit-tested; `main.rs` owns the actual terminal I/O.

use std::fmt::Write as _;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use parity_core::compare::{CompareOptions, ComparisonReport};
use parity_core::demangle::DemangleCache;
use parity_core::function::{FunctionDiffStats, Hunk};
use parity_core::normalize::NormalizeConfig;
use parity_core::sequence::DiffLine;
use parity_core::symbols::SymbolDiff;

/// On-disk comparison profile (YAML).
///
/// Everything is optional; command-line flags win over profile values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareProfile {
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub keep_linker_symbols: Option<bool>,
    #[serde(default)]
    pub context: Option<usize>,
    /// Mnemonic tables and real-target prefixes for the normalizer.
    #[serde(default)]
    pub normalize: Option<NormalizeConfig>,
}

impl CompareProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile at {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse profile at {}", path.display()))
    }

    /// Fold the profile under explicit flags into the core options.
    pub fn resolve(
        &self,
        focus: Option<String>,
        mut ignore: Vec<String>,
        keep_linker_symbols: bool,
        context: Option<usize>,
    ) -> CompareOptions {
        let mut patterns = self.ignore.clone();
        patterns.append(&mut ignore);
        CompareOptions {
            focus_prefix: focus.or_else(|| self.focus.clone()),
            ignore_patterns: patterns,
            keep_linker_symbols: keep_linker_symbols
                || self.keep_linker_symbols.unwrap_or(false),
            context: context.or(self.context).unwrap_or(3),
        }
    }
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open artifact for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read artifact for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

/// JSON envelope wrapping any report payload with run metadata.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<T: Serialize> {
    pub tool_version: &'static str,
    pub generated_at: String,
    pub report: T,
}

impl<T: Serialize> ReportEnvelope<T> {
    pub fn new(report: T) -> Self {
        Self {
            tool_version: parity_core::version(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            report,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }
}

/// JSON payload for the single-function view: hunks plus counts, enough
/// to render a unified-diff display with no further computation.
#[derive(Debug, Serialize)]
pub struct FunctionReport<'a> {
    pub name: &'a str,
    pub stats: &'a FunctionDiffStats,
    pub hunks: &'a [Hunk],
}

/// Human-readable rendering of a full comparison report.
pub fn render_report(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparing {} -> {}", report.old_name, report.new_name);
    let _ = writeln!(out, "Severity: {}", report.severity.as_str());
    let _ = writeln!(out);
    let _ = writeln!(out, "Bytes:");
    let _ = writeln!(out, "  old: {} ({} bytes)", report.bit.old_hash, report.bit.old_size);
    let _ = writeln!(out, "  new: {} ({} bytes)", report.bit.new_hash, report.bit.new_size);
    let _ = writeln!(
        out,
        "  identical: {}",
        if report.bit.identical { "yes" } else { "no" }
    );

    if report.bit.identical {
        let _ = writeln!(out);
        let _ = writeln!(out, "Artifacts are bit-identical; no further comparison needed.");
        return out;
    }

    if let Some(symbols) = &report.symbols {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Symbols: {} added, {} removed, {} changed, {} unchanged",
            symbols.added.len(),
            symbols.removed.len(),
            symbols.changed.len(),
            symbols.unchanged.len()
        );
        for sym in &symbols.added {
            let _ = writeln!(out, "  + {}", sym.name);
        }
        for sym in &symbols.removed {
            let _ = writeln!(out, "  - {}", sym.name);
        }
        for change in &symbols.changed {
            let _ = writeln!(out, "  ~ {} ({})", change.name, change.changes.join(", "));
        }
    }

    if let Some(functions) = &report.functions {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Functions: {} identical, {} modified, {} added, {} removed",
            functions.identical.len(),
            functions.modified.len(),
            functions.added.len(),
            functions.removed.len()
        );
        for name in &functions.added {
            let _ = writeln!(out, "  + {name}");
        }
        for name in &functions.removed {
            let _ = writeln!(out, "  - {name}");
        }
        for modified in &functions.modified {
            let mut signals = Vec::new();
            if modified.control_flow_changed {
                signals.push("control flow");
            }
            if modified.calls_changed {
                signals.push("calls");
            }
            let signal_text = if signals.is_empty() {
                String::new()
            } else {
                format!(" [{}]", signals.join(", "))
            };
            let _ = writeln!(
                out,
                "  ~ {} (+{} -{}){}",
                modified.name, modified.stats.added, modified.stats.removed, signal_text
            );
        }
    }

    if let Some(strings) = &report.strings {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Strings: {} added, {} removed, {} common",
            strings.added.len(),
            strings.removed.len(),
            strings.common.len()
        );
        for s in &strings.added {
            let _ = writeln!(out, "  + {s:?}");
        }
        for s in &strings.removed {
            let _ = writeln!(out, "  - {s:?}");
        }
    }

    out
}

/// Unified-diff-style rendering of one routine's hunks.
pub fn render_function_diff(
    name: &str,
    old_label: &str,
    new_label: &str,
    hunks: &[Hunk],
    stats: &FunctionDiffStats,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {old_label}:{name}");
    let _ = writeln!(out, "+++ {new_label}:{name}");
    let _ = writeln!(
        out,
        "@@ stats: {} -> {} instructions, +{} -{} ={} @@",
        stats.total_old, stats.total_new, stats.added, stats.removed, stats.unchanged
    );
    for hunk in hunks {
        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        );
        for line in &hunk.lines {
            match line {
                DiffLine::Context(key) => {
                    let _ = writeln!(out, "  {key}");
                }
                DiffLine::Removed(key) => {
                    let _ = writeln!(out, "- {key}");
                }
                DiffLine::Added(key) => {
                    let _ = writeln!(out, "+ {key}");
                }
            }
        }
    }
    if hunks.is_empty() {
        let _ = writeln!(out, "(no differences)");
    }
    out
}

/// Render a symbol partition as a flat listing, optionally demangled.
pub fn render_symbol_diff(diff: &SymbolDiff, demangle: bool) -> String {
    let mut cache = DemangleCache::new();
    let mut display = |name: &str| -> String {
        if demangle {
            cache.demangle(name)
        } else {
            name.to_string()
        }
    };

    let mut out = String::new();
    for sym in &diff.added {
        let _ = writeln!(out, "+ {}", display(&sym.name));
    }
    for sym in &diff.removed {
        let _ = writeln!(out, "- {}", display(&sym.name));
    }
    for change in &diff.changed {
        let _ = writeln!(out, "~ {} ({})", display(&change.name), change.changes.join(", "));
    }
    for sym in &diff.unchanged {
        let _ = writeln!(out, "= {}", display(&sym.name));
    }
    out
}
