//! Backend-level extraction tests.
//!
//! These drive the full `ToolchainBackend::extract` path using the
//! `BP_FAKE_*` environment seams instead of real toolchain binaries.
//! Environment variables are process-global, so everything that sets
//! them lives in this single serial test.

use std::fs;

use parity_core::extract::{
    default_backend_registry, BackendRegistry, ExtractError, ExtractRequest, ExtractionBackend,
    ToolchainBackend,
};

#[test]
fn registry_lists_stock_backends() {
    let registry = default_backend_registry();
    assert_eq!(registry.names(), vec!["binutils".to_string(), "llvm".to_string()]);
    assert!(registry.get("binutils").is_some());
    assert!(registry.get("ghidra").is_none());
}

#[test]
fn custom_backend_registration_resolves_by_name() {
    let mut registry = BackendRegistry::new();
    registry.register(ToolchainBackend::binutils());
    assert!(registry.get("binutils").is_some());
}

#[test]
fn missing_artifact_is_a_typed_error() {
    let backend = ToolchainBackend::binutils();
    let request = ExtractRequest::new("/nonexistent/artifact.so");
    match backend.extract(&request) {
        Err(ExtractError::MissingArtifact(path)) => {
            assert_eq!(path, std::path::PathBuf::from("/nonexistent/artifact.so"));
        }
        other => panic!("expected MissingArtifact, got {other:?}"),
    }
}

#[test]
fn extract_builds_snapshot_from_canned_tool_output() {
    let dir = tempfile::tempdir().expect("tempdir");

    let artifact = dir.path().join("demo");
    fs::write(&artifact, b"\x7fELF not really").expect("artifact");

    let nm_path = dir.path().join("nm.txt");
    fs::write(
        &nm_path,
        "0000000000001129 0000000000000016 T _Z3addii\n                 U printf\n",
    )
    .expect("nm");

    let objdump_path = dir.path().join("objdump.txt");
    fs::write(
        &objdump_path,
        "0000000000001129 <_Z3addii>:\n    1129:\t8d 04 37\tlea    eax,[rdi+rsi*1]\n    112c:\tc3\tret\n",
    )
    .expect("objdump");

    let strings_path = dir.path().join("strings.txt");
    fs::write(&strings_path, "Count: \nMean:  \n").expect("strings");

    std::env::set_var("BP_FAKE_NM", &nm_path);
    std::env::set_var("BP_FAKE_OBJDUMP", &objdump_path);
    std::env::set_var("BP_FAKE_STRINGS", &strings_path);

    let backend = ToolchainBackend::binutils();
    let snapshot = backend.extract(&ExtractRequest::new(&artifact)).expect("extract");

    std::env::remove_var("BP_FAKE_NM");
    std::env::remove_var("BP_FAKE_OBJDUMP");
    std::env::remove_var("BP_FAKE_STRINGS");

    assert_eq!(snapshot.name, "demo");
    assert_eq!(snapshot.bytes, b"\x7fELF not really");
    assert_eq!(snapshot.symbols.len(), 2);
    assert_eq!(snapshot.functions.len(), 1);
    assert_eq!(snapshot.functions["_Z3addii"].instructions.len(), 2);
    assert_eq!(snapshot.strings, vec!["Count: ".to_string(), "Mean:  ".to_string()]);
}
