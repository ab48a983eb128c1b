mod common;

use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

fn two_artifacts(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let old = dir.join("demo-old");
    let new = dir.join("demo-new");
    fs::write(&old, b"old build bytes").expect("old");
    fs::write(&new, b"new build bytes").expect("new");
    (old, new)
}

#[test]
fn symbols_command_lists_partition_counts() {
    let dir = tempdir().expect("tempdir");
    let (old, new) = two_artifacts(dir.path());

    common::fake_backend_cmd(dir.path())
        .arg("symbols")
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains("Symbols: 0 added, 0 removed, 0 changed, 2 unchanged"))
        .stdout(predicate::str::contains("= _Z3addii"));
}

#[test]
fn symbols_command_honors_focus_and_ignore() {
    let dir = tempdir().expect("tempdir");
    let (old, new) = two_artifacts(dir.path());

    common::fake_backend_cmd(dir.path())
        .arg("symbols")
        .arg(&old)
        .arg(&new)
        .arg("--ignore")
        .arg("counter")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unchanged"));
}

#[test]
fn symbols_command_emits_json() {
    let dir = tempdir().expect("tempdir");
    let (old, new) = two_artifacts(dir.path());

    common::fake_backend_cmd(dir.path())
        .arg("symbols")
        .arg(&old)
        .arg(&new)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unchanged\""))
        .stdout(predicate::str::contains("\"_Z3addii\""));
}

#[test]
fn strings_command_reports_common_literals() {
    let dir = tempdir().expect("tempdir");
    let (old, new) = two_artifacts(dir.path());

    common::fake_backend_cmd(dir.path())
        .arg("strings")
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains("Strings: 0 added, 0 removed, 2 common"));
}

#[test]
fn hash_command_prints_sha256() {
    let dir = tempdir().expect("tempdir");
    let artifact = dir.path().join("demo");
    fs::write(&artifact, b"abc").expect("artifact");

    assert_cmd::cargo::cargo_bin_cmd!("binparity")
        .arg("hash")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        ));
}
