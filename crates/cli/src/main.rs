use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use binparity::{
    render_function_diff, render_report, render_symbol_diff, sha256_file, CompareProfile,
    FunctionReport, ReportEnvelope,
};
use clap::{Parser, Subcommand, ValueEnum};

use parity_core::compare::compare_snapshots;
use parity_core::extract::{default_backend_registry, ExtractRequest};
use parity_core::function::{build_hunks, diff_function};
use parity_core::model::ArtifactSnapshot;
use parity_core::normalize::Normalizer;
use parity_core::severity::Severity;
use parity_core::strings::diff_strings;
use parity_core::symbols::{diff_symbols, IgnoreSpec};

/// Build-equivalence checker CLI.
///
/// This CLI is a thin wrapper around `parity-core` (exposed in code as
/// `parity_core`). All substantive logic lives in the library so it can
/// be tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "binparity",
    version,
    about = "Compare two builds of a compiled artifact",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Severity threshold at or above which `compare` exits with an error.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FailLevel {
    Low,
    Medium,
    High,
}

impl From<FailLevel> for Severity {
    fn from(level: FailLevel) -> Self {
        match level {
            FailLevel::Low => Severity::Low,
            FailLevel::Medium => Severity::Medium,
            FailLevel::High => Severity::High,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two builds across all layers and classify the result.
    ///
    /// Layers: byte identity, symbol table, per-function instruction
    /// bodies (normalized), and embedded string literals.
    Compare {
        /// Path to the old (reference) build.
        old: PathBuf,

        /// Path to the new (candidate) build.
        new: PathBuf,

        /// Extraction backend to use (see `nm`/`objdump`/`strings`
        /// flavor names).
        #[arg(long, default_value = "binutils")]
        backend: String,

        /// Optional YAML comparison profile; explicit flags win.
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Keep only symbol/function names containing this substring.
        #[arg(long)]
        focus: Option<String>,

        /// Glob pattern for names to drop; repeatable.
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Keep linker-derived symbol annotations when normalizing.
        #[arg(long, default_value_t = false)]
        keep_linker_symbols: bool,

        /// Context lines around changes in rendered hunks.
        #[arg(long)]
        context: Option<usize>,

        /// Per-routine instruction cap applied at extraction time.
        #[arg(long)]
        max_instructions: Option<usize>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit non-zero when the verdict is at or above this severity.
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,
    },

    /// Show the instruction-level diff of one routine.
    Function {
        /// Path to the old (reference) build.
        old: PathBuf,

        /// Path to the new (candidate) build.
        new: PathBuf,

        /// Routine name, as it appears in the symbol table.
        name: String,

        /// Extraction backend to use.
        #[arg(long, default_value = "binutils")]
        backend: String,

        /// Optional YAML comparison profile; explicit flags win.
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Keep linker-derived symbol annotations when normalizing.
        #[arg(long, default_value_t = false)]
        keep_linker_symbols: bool,

        /// Context lines around each change.
        #[arg(long, default_value_t = 3)]
        context: usize,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Diff the symbol tables of two builds.
    Symbols {
        /// Path to the old (reference) build.
        old: PathBuf,

        /// Path to the new (candidate) build.
        new: PathBuf,

        /// Extraction backend to use.
        #[arg(long, default_value = "binutils")]
        backend: String,

        /// Keep only names containing this substring.
        #[arg(long)]
        focus: Option<String>,

        /// Glob pattern for names to drop; repeatable.
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Demangle names for display.
        #[arg(long, default_value_t = false)]
        demangle: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Diff the embedded string literals of two builds.
    Strings {
        /// Path to the old (reference) build.
        old: PathBuf,

        /// Path to the new (candidate) build.
        new: PathBuf,

        /// Extraction backend to use.
        #[arg(long, default_value = "binutils")]
        backend: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the SHA-256 hash of an artifact.
    Hash {
        /// Path to the artifact.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Compare {
            old,
            new,
            backend,
            profile,
            focus,
            ignore,
            keep_linker_symbols,
            context,
            max_instructions,
            json,
            fail_on,
        } => compare_command(
            &old,
            &new,
            &backend,
            profile.as_deref(),
            focus,
            ignore,
            keep_linker_symbols,
            context,
            max_instructions,
            json,
            fail_on,
        )?,
        Command::Function {
            old,
            new,
            name,
            backend,
            profile,
            keep_linker_symbols,
            context,
            json,
        } => function_command(
            &old,
            &new,
            &name,
            &backend,
            profile.as_deref(),
            keep_linker_symbols,
            context,
            json,
        )?,
        Command::Symbols { old, new, backend, focus, ignore, demangle, json } => {
            symbols_command(&old, &new, &backend, focus, ignore, demangle, json)?
        }
        Command::Strings { old, new, backend, json } => {
            strings_command(&old, &new, &backend, json)?
        }
        Command::Hash { path } => hash_command(&path)?,
    }

    Ok(())
}

/// Extract one artifact via the named backend.
fn load_snapshot(
    backend_name: &str,
    path: &Path,
    max_instructions: Option<usize>,
) -> Result<ArtifactSnapshot> {
    let registry = default_backend_registry();
    let backend = registry.get(backend_name).ok_or_else(|| {
        anyhow!(
            "Unknown extraction backend {backend_name:?}; available: {}",
            registry.names().join(", ")
        )
    })?;

    let mut request = ExtractRequest::new(path);
    request.max_instructions_per_function = max_instructions;
    backend
        .extract(&request)
        .with_context(|| format!("Failed to extract {}", path.display()))
}

fn load_profile(path: Option<&Path>) -> Result<CompareProfile> {
    match path {
        Some(p) => CompareProfile::load(p),
        None => Ok(CompareProfile::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn compare_command(
    old: &Path,
    new: &Path,
    backend: &str,
    profile_path: Option<&Path>,
    focus: Option<String>,
    ignore: Vec<String>,
    keep_linker_symbols: bool,
    context: Option<usize>,
    max_instructions: Option<usize>,
    json: bool,
    fail_on: Option<FailLevel>,
) -> Result<()> {
    let profile = load_profile(profile_path)?;
    let options = profile.resolve(focus, ignore, keep_linker_symbols, context);
    let normalizer = Normalizer::new(profile.normalize.clone().unwrap_or_default());

    let old_snapshot = load_snapshot(backend, old, max_instructions)?;
    let new_snapshot = load_snapshot(backend, new, max_instructions)?;

    let report = compare_snapshots(&old_snapshot, &new_snapshot, &options, &normalizer)?;

    if json {
        println!("{}", ReportEnvelope::new(&report).to_json()?);
    } else {
        print!("{}", render_report(&report));
    }

    if let Some(level) = fail_on {
        let threshold: Severity = level.into();
        if report.severity >= threshold {
            bail!("Severity {} is at or above the failure threshold", report.severity.as_str());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn function_command(
    old: &Path,
    new: &Path,
    name: &str,
    backend: &str,
    profile_path: Option<&Path>,
    keep_linker_symbols: bool,
    context: usize,
    json: bool,
) -> Result<()> {
    let profile = load_profile(profile_path)?;
    let keep = keep_linker_symbols || profile.keep_linker_symbols.unwrap_or(false);
    let normalizer = Normalizer::new(profile.normalize.clone().unwrap_or_default());

    let old_snapshot = load_snapshot(backend, old, None)?;
    let new_snapshot = load_snapshot(backend, new, None)?;

    let old_fn = old_snapshot
        .functions
        .get(name)
        .ok_or_else(|| anyhow!("Function {name:?} not found in {}", old.display()))?;
    let new_fn = new_snapshot
        .functions
        .get(name)
        .ok_or_else(|| anyhow!("Function {name:?} not found in {}", new.display()))?;

    let result = diff_function(old_fn, new_fn, &normalizer, keep);
    let hunks = build_hunks(&result.lines, context);

    if json {
        let payload = FunctionReport { name, stats: &result.stats, hunks: &hunks };
        println!("{}", ReportEnvelope::new(&payload).to_json()?);
    } else {
        print!(
            "{}",
            render_function_diff(
                name,
                &old.display().to_string(),
                &new.display().to_string(),
                &hunks,
                &result.stats
            )
        );
    }

    Ok(())
}

fn symbols_command(
    old: &Path,
    new: &Path,
    backend: &str,
    focus: Option<String>,
    ignore: Vec<String>,
    demangle: bool,
    json: bool,
) -> Result<()> {
    let ignore_spec = IgnoreSpec::compile(&ignore).context("Invalid ignore pattern")?;

    let old_snapshot = load_snapshot(backend, old, None)?;
    let new_snapshot = load_snapshot(backend, new, None)?;

    let diff =
        diff_symbols(&old_snapshot.symbols, &new_snapshot.symbols, focus.as_deref(), &ignore_spec);

    if json {
        println!("{}", ReportEnvelope::new(&diff).to_json()?);
    } else {
        println!(
            "Symbols: {} added, {} removed, {} changed, {} unchanged",
            diff.added.len(),
            diff.removed.len(),
            diff.changed.len(),
            diff.unchanged.len()
        );
        print!("{}", render_symbol_diff(&diff, demangle));
    }

    Ok(())
}

fn strings_command(old: &Path, new: &Path, backend: &str, json: bool) -> Result<()> {
    let old_snapshot = load_snapshot(backend, old, None)?;
    let new_snapshot = load_snapshot(backend, new, None)?;

    let diff = diff_strings(&old_snapshot.strings, &new_snapshot.strings);

    if json {
        println!("{}", ReportEnvelope::new(&diff).to_json()?);
    } else {
        println!(
            "Strings: {} added, {} removed, {} common",
            diff.added.len(),
            diff.removed.len(),
            diff.common.len()
        );
        for s in &diff.added {
            println!("+ {s:?}");
        }
        for s in &diff.removed {
            println!("- {s:?}");
        }
    }

    Ok(())
}

fn hash_command(path: &Path) -> Result<()> {
    let digest = sha256_file(path)?;
    println!("{digest}  {}", path.display());
    Ok(())
}
