//! Extraction backends.
//!
//! Extraction is the only part of this crate that performs I/O: it runs
//! platform toolchain utilities over an artifact and parses their text
//! output into an [`ArtifactSnapshot`]. The diff engines never see a
//! partially extracted snapshot; any failure here is surfaced as an
//! [`ExtractError`] and the comparison refuses to run.

mod toolchain;

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ArtifactSnapshot;

pub use toolchain::{parse_nm_output, parse_objdump_output, ToolchainBackend, ToolchainSpec};

/// Error type for extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Artifact not found at {0}")]
    MissingArtifact(PathBuf),
    #[error("Extraction tool not available: {0}")]
    MissingTool(String),
    #[error("Extraction tool failed: {0}")]
    Tool(String),
    #[error("Unparseable tool output: {0}")]
    Parse(String),
}

/// Request to extract one artifact.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub artifact_path: PathBuf,
    /// Per-routine instruction cap. Routines past the cap are truncated
    /// at extraction time so pathologically large bodies cannot stall the
    /// quadratic per-routine diff.
    pub max_instructions_per_function: Option<usize>,
}

impl ExtractRequest {
    pub fn new(artifact_path: impl Into<PathBuf>) -> Self {
        Self { artifact_path: artifact_path.into(), max_instructions_per_function: None }
    }
}

/// Trait implemented by extraction backends (toolchain flavors).
pub trait ExtractionBackend: Send + Sync {
    fn extract(&self, request: &ExtractRequest) -> Result<ArtifactSnapshot, ExtractError>;
    fn name(&self) -> &'static str;
}

/// Registry for extraction backends; callers select by name.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn ExtractionBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register<B: ExtractionBackend + 'static>(&mut self, backend: B) -> &mut Self {
        self.backends.insert(backend.name().to_string(), Box::new(backend));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExtractionBackend> {
        self.backends.get(name).map(|b| &**b)
    }

    /// Sorted backend names for error messages and help output.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with the stock toolchain backends.
pub fn default_backend_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(ToolchainBackend::binutils());
    registry.register(ToolchainBackend::llvm());
    registry
}
