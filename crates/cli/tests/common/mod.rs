//! Shared fixtures for CLI tests: canned toolchain outputs fed through
//! the `BP_FAKE_*` extraction seams, so no real `nm`/`objdump`/`strings`
//! is ever needed.

use std::fs;
use std::path::{Path, PathBuf};

pub const NM_OUTPUT: &str = "\
0000000000001129 0000000000000016 T _Z3addii
0000000000004010 0000000000000004 B counter
";

pub const OBJDUMP_OUTPUT: &str = "\
0000000000001129 <_Z3addii>:
    1129:\tf3 0f 1e fa\tendbr64
    112d:\t8d 04 37\tlea    eax,[rdi+rsi*1]
    1130:\tc3\tret
";

pub const STRINGS_OUTPUT: &str = "Count: \nMean:  \n";

/// Write canned tool outputs into `dir` and return the three paths in
/// (nm, objdump, strings) order.
pub fn write_fake_outputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let nm = dir.join("nm.txt");
    let objdump = dir.join("objdump.txt");
    let strings = dir.join("strings.txt");
    fs::write(&nm, NM_OUTPUT).expect("nm fixture");
    fs::write(&objdump, OBJDUMP_OUTPUT).expect("objdump fixture");
    fs::write(&strings, STRINGS_OUTPUT).expect("strings fixture");
    (nm, objdump, strings)
}

/// A binparity command wired to the canned outputs.
pub fn fake_backend_cmd(dir: &Path) -> assert_cmd::Command {
    let (nm, objdump, strings) = write_fake_outputs(dir);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("binparity");
    cmd.env("BP_FAKE_NM", nm).env("BP_FAKE_OBJDUMP", objdump).env("BP_FAKE_STRINGS", strings);
    cmd
}
