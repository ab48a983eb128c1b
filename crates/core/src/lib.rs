//! parity-core
//!
//! Core diff engine for comparing two builds of a compiled artifact.
//!
//! This crate defines the data model, the instruction normalizer, the
//! per-layer diff engines (symbols, function bodies, string literals), the
//! bit-equivalence check and severity classifier, and the extraction
//! backends that turn toolchain output into typed collections.
//!
//! All comparison logic lives here so it is fully testable and reusable
//! from multiple frontends (CLI, CI harnesses, etc.). The diff modules
//! perform no I/O; only the `extract` module shells out to toolchain
//! utilities.

pub mod compare;
pub mod demangle;
pub mod extract;
pub mod function;
pub mod model;
pub mod normalize;
pub mod sequence;
pub mod severity;
pub mod strings;
pub mod symbols;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
