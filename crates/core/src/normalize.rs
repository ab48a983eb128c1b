//! Instruction normalization.
//!
//! Disassembly text is full of link-time and load-time noise: absolute
//! addresses, symbol+offset annotations, and "nearest known symbol" labels
//! that differ between linkers without any behavioral change. The
//! [`Normalizer`] canonicalizes one instruction into a comparison key that
//! keeps semantic content (opcode, register/immediate shape, real call
//! targets) and drops the rest.
//!
//! Which mnemonics count as address-loading, which as calls, and which
//! name prefixes mark a real call target are ABI/toolchain specific, so
//! they live in [`NormalizeConfig`] as data rather than in code.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Instruction;

/// Placeholder for a hexadecimal address literal.
const ADDR_TOKEN: &str = "<addr>";
/// Placeholder for a collapsed memory displacement.
const OFF_TOKEN: &str = "#<off>";
/// Placeholder for a collapsed immediate operand.
const IMM_TOKEN: &str = "#<imm>";

/// Mnemonic tables and name heuristics driving normalization.
///
/// Defaults are tuned for AArch64 and x86-64 output of `objdump`/`otool`
/// style disassembly with Itanium C++ mangling. Hosts targeting another
/// ABI swap the tables, not the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Mnemonics that materialize addresses (page/address loads, plain
    /// loads/stores, load-effective-address). Their symbol annotations are
    /// "nearest known symbol" labels, not operands.
    #[serde(default = "default_address_load_mnemonics")]
    pub address_load_mnemonics: BTreeSet<String>,
    /// Call mnemonics. Their annotations are kept only when the target
    /// policy accepts them.
    #[serde(default = "default_call_mnemonics")]
    pub call_mnemonics: BTreeSet<String>,
    /// Branch/return mnemonics, used for the changed-control-flow signal.
    #[serde(default = "default_control_flow_mnemonics")]
    pub control_flow_mnemonics: BTreeSet<String>,
    /// Name prefixes that mark an annotation as a real call target rather
    /// than a linker stub label.
    #[serde(default = "default_real_target_prefixes")]
    pub real_target_prefixes: Vec<String>,
}

fn default_address_load_mnemonics() -> BTreeSet<String> {
    [
        "adrp", "adr", "ldr", "ldur", "ldrb", "ldrh", "ldrsw", "ldp", "str", "stur", "strb",
        "strh", "stp", "lea",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_call_mnemonics() -> BTreeSet<String> {
    ["bl", "blr", "call", "callq"].into_iter().map(str::to_string).collect()
}

fn default_control_flow_mnemonics() -> BTreeSet<String> {
    ["b", "br", "ret", "retq", "cbz", "cbnz", "tbz", "tbnz", "jmp"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_real_target_prefixes() -> Vec<String> {
    vec!["_Z".to_string(), "__Z".to_string(), "_main".to_string()]
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            address_load_mnemonics: default_address_load_mnemonics(),
            call_mnemonics: default_call_mnemonics(),
            control_flow_mnemonics: default_control_flow_mnemonics(),
            real_target_prefixes: default_real_target_prefixes(),
        }
    }
}

/// Decides whether a symbol annotation on a call names a real target.
///
/// "Real" is inherently approximate: stub/PLT indirections resolve to
/// different nearest-symbols across linkers, while genuine targets carry a
/// recognizable mangling prefix. Kept behind a trait so hosts can swap or
/// unit-test the heuristic independently.
pub trait TargetPolicy: Send + Sync {
    fn is_likely_real_target(&self, symbol: &str) -> bool;
}

/// Default policy: a target is real when it starts with one of the
/// configured mangling prefixes.
#[derive(Debug, Clone)]
pub struct PrefixTargetPolicy {
    prefixes: Vec<String>,
}

impl PrefixTargetPolicy {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self::new(config.real_target_prefixes.clone())
    }
}

impl TargetPolicy for PrefixTargetPolicy {
    fn is_likely_real_target(&self, symbol: &str) -> bool {
        self.prefixes.iter().any(|p| symbol.starts_with(p.as_str()))
    }
}

/// Mnemonic class relevant to annotation handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MnemonicClass {
    AddressLoad,
    Call,
    Other,
}

/// Canonicalizes instructions into comparison keys.
///
/// `normalize` is a pure function of the instruction and the flag; the
/// normalizer holds no mutable state and may be shared freely.
pub struct Normalizer {
    config: NormalizeConfig,
    policy: Box<dyn TargetPolicy>,
}

impl Normalizer {
    /// Normalizer with the default prefix-based target policy derived from
    /// the config's prefix table.
    pub fn new(config: NormalizeConfig) -> Self {
        let policy = Box::new(PrefixTargetPolicy::from_config(&config));
        Self { config, policy }
    }

    /// Normalizer with a caller-supplied target policy.
    pub fn with_policy(config: NormalizeConfig, policy: Box<dyn TargetPolicy>) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Produce the comparison key for one instruction.
    ///
    /// Applied transformations:
    /// 1. hex literals (`0x...`) become `<addr>`;
    /// 2. `<sym+0x10>` collapses to `<sym>`;
    /// 3. `[reg, #N]` displacements collapse to `[reg, #<off>]`;
    /// 4. standalone `#N` immediates collapse to `#<imm>`;
    /// 5. address-loading mnemonics lose their symbol annotation entirely
    ///    unless `keep_linker_symbols` is set;
    /// 6. call mnemonics keep their annotation only when the target policy
    ///    accepts it or the annotation carries an explicit `+0x` offset
    ///    (an intra-object target);
    /// 7. whitespace runs collapse; the key is `"<mnemonic> <operands>"`.
    ///
    /// The keep/strip decision of rules 5-6 is evaluated against the raw
    /// annotation text, before offsets collapse, so the internal-offset
    /// heuristic can observe the offset.
    pub fn normalize(&self, ins: &Instruction, keep_linker_symbols: bool) -> String {
        let mnemonic = ins.mnemonic.trim();
        let class = self.classify(mnemonic);
        let operands = rewrite_annotations(
            &ins.operands,
            class,
            keep_linker_symbols,
            self.policy.as_ref(),
        );
        let operands = replace_hex_literals(&operands);
        let operands = collapse_hash_numbers(&operands);
        let joined = format!("{mnemonic} {operands}");
        let mut key = collapse_whitespace(&joined);
        while key.ends_with(',') {
            key.pop();
            key.truncate(key.trim_end().len());
        }
        key
    }

    /// Whether a mnemonic is a call, per the configured table.
    pub fn is_call(&self, mnemonic: &str) -> bool {
        self.config.call_mnemonics.contains(&mnemonic.to_ascii_lowercase())
    }

    /// Whether a mnemonic transfers control (branch/return/call).
    ///
    /// Conditional forms are matched by shape (`b.<cond>` on AArch64,
    /// `j<cc>` on x86) on top of the configured table.
    pub fn is_control_flow(&self, mnemonic: &str) -> bool {
        let m = mnemonic.to_ascii_lowercase();
        self.config.control_flow_mnemonics.contains(&m)
            || self.config.call_mnemonics.contains(&m)
            || m.starts_with("b.")
            || (m.len() > 1 && m.starts_with('j'))
    }

    fn classify(&self, mnemonic: &str) -> MnemonicClass {
        let m = mnemonic.to_ascii_lowercase();
        if self.config.address_load_mnemonics.contains(&m) {
            MnemonicClass::AddressLoad
        } else if self.config.call_mnemonics.contains(&m) {
            MnemonicClass::Call
        } else {
            MnemonicClass::Other
        }
    }
}

/// Handle every `<...>` annotation group in the operand text.
///
/// For each group the symbol base and the presence of a trailing numeric
/// offset are read from the raw text; the group is then kept (with the
/// offset collapsed away) or stripped according to the mnemonic class.
/// A bare-hex address token directly in front of a group is replaced with
/// `<addr>` so that stripped annotations do not leave a distinguishing
/// raw target behind.
fn rewrite_annotations(
    operands: &str,
    class: MnemonicClass,
    keep_linker_symbols: bool,
    policy: &dyn TargetPolicy,
) -> String {
    let mut out = String::with_capacity(operands.len());
    let mut rest = operands;
    while let Some(start) = rest.find('<') {
        let Some(end_rel) = rest[start..].find('>') else {
            break;
        };
        let end = start + end_rel;
        let before = &rest[..start];
        let group = &rest[start + 1..end];

        out.push_str(&replace_trailing_bare_hex(before));

        let (base, had_offset) = split_symbol_offset(group);
        let keep = if keep_linker_symbols {
            true
        } else {
            match class {
                MnemonicClass::AddressLoad => false,
                MnemonicClass::Call => policy.is_likely_real_target(base) || had_offset,
                MnemonicClass::Other => true,
            }
        };
        if keep {
            out.push('<');
            out.push_str(base);
            out.push('>');
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Split `sym+0x40` / `sym+12` into the symbol base and an offset flag.
///
/// The rightmost `+` is used; mangled names do not contain `+`, so this
/// only ever splits a genuine offset suffix.
fn split_symbol_offset(group: &str) -> (&str, bool) {
    if let Some(idx) = group.rfind('+') {
        let suffix = &group[idx + 1..];
        if is_numeric_offset(suffix) {
            return (&group[..idx], true);
        }
    }
    (group, false)
}

fn is_numeric_offset(text: &str) -> bool {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else {
        !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
    }
}

/// Replace a bare-hex token at the end of `text` (an annotation-adjacent
/// raw address, as `objdump` prints for branch targets) with `<addr>`.
fn replace_trailing_bare_hex(text: &str) -> String {
    let trimmed = text.trim_end();
    let token_start = trimmed
        .rfind(|c: char| c == ' ' || c == ',' || c == '\t')
        .map(|i| i + 1)
        .unwrap_or(0);
    let token = &trimmed[token_start..];
    let is_bare_hex =
        !token.is_empty() && !token.starts_with("0x") && token.chars().all(|c| c.is_ascii_hexdigit());
    if is_bare_hex {
        let mut out = String::with_capacity(text.len());
        out.push_str(&trimmed[..token_start]);
        out.push_str(ADDR_TOKEN);
        out.push_str(&text[trimmed.len()..]);
        out
    } else {
        text.to_string()
    }
}

/// Replace every `0x<hexdigits>` literal with `<addr>`.
fn replace_hex_literals(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        let at_boundary = i == 0 || {
            let prev = bytes[i - 1] as char;
            !prev.is_ascii_alphanumeric() && prev != '_'
        };
        if at_boundary
            && bytes[i] == b'0'
            && i + 1 < bytes.len()
            && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X')
        {
            let mut j = i + 2;
            while j < bytes.len() && (bytes[j] as char).is_ascii_hexdigit() {
                j += 1;
            }
            if j > i + 2 {
                out.push_str(ADDR_TOKEN);
                i = j;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

/// Collapse `#`-prefixed numerics: displacements inside square brackets
/// become `#<off>`, standalone immediates become `#<imm>`.
///
/// Runs after hex replacement, so the numeric may already be `<addr>`.
fn collapse_hash_numbers(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                depth += 1;
                out.push('[');
                i += 1;
            }
            b']' => {
                depth = depth.saturating_sub(1);
                out.push(']');
                i += 1;
            }
            b'#' => {
                let mut j = i + 1;
                if j < bytes.len() && bytes[j] == b'-' {
                    j += 1;
                }
                let value_len = if text[j..].starts_with(ADDR_TOKEN) {
                    ADDR_TOKEN.len()
                } else {
                    bytes[j..].iter().take_while(|b| (**b as char).is_ascii_digit()).count()
                };
                if value_len > 0 {
                    out.push_str(if depth > 0 { OFF_TOKEN } else { IMM_TOKEN });
                    i = j + value_len;
                } else {
                    out.push('#');
                    i += 1;
                }
            }
            other => {
                out.push(other as char);
                i += 1;
            }
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
