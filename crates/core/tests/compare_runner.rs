use parity_core::compare::{compare_snapshots, CompareError, CompareOptions};
use parity_core::model::{
    function_map, ArtifactSnapshot, DisassembledFunction, Instruction, Symbol, SymbolBinding,
    SymbolKind,
};
use parity_core::normalize::{NormalizeConfig, Normalizer};
use parity_core::severity::Severity;

fn func(name: &str, mnemonics: &[&str]) -> DisassembledFunction {
    let mut f = DisassembledFunction::new(name, 0x1000);
    for (idx, m) in mnemonics.iter().enumerate() {
        f.instructions.push(Instruction::new(0x1000 + idx as u64 * 4, "00", *m, "", *m));
    }
    f
}

fn snapshot(name: &str, bytes: &[u8], functions: Vec<DisassembledFunction>) -> ArtifactSnapshot {
    let mut snap = ArtifactSnapshot::new(name);
    snap.bytes = bytes.to_vec();
    snap.symbols = functions
        .iter()
        .map(|f| Symbol {
            name: f.name.clone(),
            kind: SymbolKind::Function,
            binding: SymbolBinding::Global,
            address: Some(f.start_address),
            size: None,
            section: None,
        })
        .collect();
    snap.functions = function_map(functions);
    snap.strings = vec!["hello".to_string()];
    snap
}

fn normalizer() -> Normalizer {
    Normalizer::new(NormalizeConfig::default())
}

/// Bit-identical artifacts short-circuit: the layer diffs are never
/// computed and the verdict is Identical.
#[test]
fn identical_bytes_skip_layer_diffs() {
    let old = snapshot("demo", b"exact bytes", vec![func("f", &["ret"])]);
    let new = snapshot("demo", b"exact bytes", vec![func("f", &["nop", "ret"])]);

    let report = compare_snapshots(&old, &new, &CompareOptions::default(), &normalizer())
        .expect("compare");
    assert_eq!(report.severity, Severity::Identical);
    assert!(report.bit.identical);
    assert!(report.symbols.is_none());
    assert!(report.functions.is_none());
    assert!(report.strings.is_none());
}

#[test]
fn removed_function_classifies_high() {
    let old = snapshot("demo", b"old", vec![func("kept", &["ret"]), func("gone", &["ret"])]);
    let new = snapshot("demo", b"new", vec![func("kept", &["ret"])]);

    let report = compare_snapshots(&old, &new, &CompareOptions::default(), &normalizer())
        .expect("compare");
    assert_eq!(report.severity, Severity::High);
    let functions = report.functions.expect("functions diff");
    assert_eq!(functions.removed, vec!["gone".to_string()]);
    let symbols = report.symbols.expect("symbols diff");
    assert_eq!(symbols.removed.len(), 1);
}

#[test]
fn unchanged_layers_classify_low() {
    let old = snapshot("demo", b"old bytes", vec![func("f", &["ret"])]);
    let new = snapshot("demo", b"new bytes", vec![func("f", &["ret"])]);

    let report = compare_snapshots(&old, &new, &CompareOptions::default(), &normalizer())
        .expect("compare");
    assert_eq!(report.severity, Severity::Low);
    let functions = report.functions.expect("functions diff");
    assert_eq!(functions.identical, vec!["f".to_string()]);
}

#[test]
fn bad_ignore_pattern_aborts_before_any_diff() {
    let old = snapshot("demo", b"old", vec![func("f", &["ret"])]);
    let new = snapshot("demo", b"new", vec![func("f", &["ret"])]);
    let options = CompareOptions {
        ignore_patterns: vec!["good*".to_string(), "bad[0-9]".to_string()],
        ..Default::default()
    };

    let err = compare_snapshots(&old, &new, &options, &normalizer()).unwrap_err();
    assert!(matches!(err, CompareError::Pattern(_)));
}

#[test]
fn focus_prefix_applies_to_functions_too() {
    let old = snapshot(
        "demo",
        b"old",
        vec![func("_ZN4Mesh4drawEv", &["ret"]), func("_ZN5Audio4playEv", &["ret"])],
    );
    let new = snapshot("demo", b"new", vec![func("_ZN4Mesh4drawEv", &["ret"])]);
    let options =
        CompareOptions { focus_prefix: Some("Mesh".to_string()), ..Default::default() };

    let report = compare_snapshots(&old, &new, &options, &normalizer()).expect("compare");
    let functions = report.functions.expect("functions diff");
    // Audio is outside the focus, so its disappearance is not a removal.
    assert!(functions.removed.is_empty());
    assert_eq!(functions.identical, vec!["_ZN4Mesh4drawEv".to_string()]);
    assert_eq!(report.severity, Severity::Low);
}

#[test]
fn ignored_functions_do_not_drive_severity() {
    let old = snapshot(
        "demo",
        b"old",
        vec![func("real", &["ret"]), func("GCC_except_table12", &["ret"])],
    );
    let new = snapshot("demo", b"new", vec![func("real", &["ret"])]);
    let options = CompareOptions {
        ignore_patterns: vec!["GCC_except_table*".to_string()],
        ..Default::default()
    };

    let report = compare_snapshots(&old, &new, &options, &normalizer()).expect("compare");
    assert_eq!(report.severity, Severity::Low);
    assert!(report.functions.expect("functions diff").removed.is_empty());
}
