use parity_core::function::{FunctionSetDiff, ModifiedFunction};
use parity_core::severity::{check_bit_equivalence, classify_severity, Severity};
use parity_core::strings::diff_strings;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn string_diff_is_verbatim_set_difference() {
    let old = strings(&["Count: ", "Mean:  ", "shared"]);
    let new = strings(&["Count: ", "Total: ", "shared"]);
    let diff = diff_strings(&old, &new);

    assert_eq!(diff.removed, strings(&["Mean:  "]));
    assert_eq!(diff.added, strings(&["Total: "]));
    assert_eq!(diff.common, strings(&["Count: ", "shared"]));
}

#[test]
fn string_diff_deduplicates() {
    let old = strings(&["dup", "dup", "only-old"]);
    let new = strings(&["dup"]);
    let diff = diff_strings(&old, &new);

    assert_eq!(diff.common, strings(&["dup"]));
    assert_eq!(diff.removed, strings(&["only-old"]));
}

#[test]
fn bit_equivalence_is_decided_by_hash() {
    let same = check_bit_equivalence(b"artifact", b"artifact");
    assert!(same.identical);
    assert_eq!(same.old_hash, same.new_hash);
    assert_eq!(same.old_size, 8);

    let diff = check_bit_equivalence(b"artifact", b"artifacT");
    assert!(!diff.identical);
    assert_ne!(diff.old_hash, diff.new_hash);
    // Sizes match here; hash equality is the criterion, not size.
    assert_eq!(diff.old_size, diff.new_size);
}

#[test]
fn hashes_are_computed_even_on_size_mismatch() {
    let result = check_bit_equivalence(b"short", b"much longer artifact");
    assert!(!result.identical);
    assert_eq!(result.old_hash.len(), 64);
    assert_eq!(result.new_hash.len(), 64);
    assert_ne!(result.old_size, result.new_size);
}

fn modified(count: usize) -> Vec<ModifiedFunction> {
    (0..count)
        .map(|i| ModifiedFunction {
            name: format!("f{i}"),
            stats: Default::default(),
            control_flow_changed: false,
            calls_changed: false,
        })
        .collect()
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("f{i}")).collect()
}

#[test]
fn identical_bytes_win_over_everything() {
    let bit = check_bit_equivalence(b"same", b"same");
    // Layer diffs were never computed; the verdict must not need them.
    assert_eq!(classify_severity(&bit, None, None, None), Severity::Identical);

    let scary = FunctionSetDiff { removed: names(3), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&scary), None), Severity::Identical);
}

#[test]
fn removed_function_is_high() {
    let bit = check_bit_equivalence(b"a", b"b");
    let functions = FunctionSetDiff { removed: names(1), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&functions), None), Severity::High);
}

#[test]
fn added_and_modified_thresholds_are_medium() {
    let bit = check_bit_equivalence(b"a", b"b");

    let many_added = FunctionSetDiff { added: names(6), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&many_added), None), Severity::Medium);

    let few_added = FunctionSetDiff { added: names(5), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&few_added), None), Severity::Low);

    let many_modified = FunctionSetDiff { modified: modified(11), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&many_modified), None), Severity::Medium);

    let few_modified = FunctionSetDiff { modified: modified(10), ..Default::default() };
    assert_eq!(classify_severity(&bit, None, Some(&few_modified), None), Severity::Low);
}

#[test]
fn byte_differences_without_function_changes_are_low() {
    let bit = check_bit_equivalence(b"a", b"b");
    // String-literal-only differences, or no layer data at all: Low.
    assert_eq!(classify_severity(&bit, None, None, None), Severity::Low);
    assert_eq!(
        classify_severity(&bit, None, Some(&FunctionSetDiff::default()), None),
        Severity::Low
    );
}
