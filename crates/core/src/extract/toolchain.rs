//! Toolchain-driven extraction.
//!
//! One backend implementation parameterized by tool names, registered
//! once per toolchain flavor (GNU binutils, LLVM). The tools are invoked
//! as subprocesses and their *text* output is parsed; this crate never
//! reads object-file structures itself.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::model::{
    ArtifactSnapshot, DisassembledFunction, FunctionMap, Instruction, Symbol, SymbolBinding,
    SymbolKind,
};

use super::{ExtractError, ExtractRequest, ExtractionBackend};

/// Tool names for one toolchain flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSpec {
    pub nm: &'static str,
    pub objdump: &'static str,
    pub strings: &'static str,
}

/// Extraction backend that shells out to an `nm`/`objdump`/`strings`
/// style toolchain.
///
/// Tests can bypass the subprocesses entirely by pointing the
/// `BP_FAKE_NM`, `BP_FAKE_OBJDUMP`, and `BP_FAKE_STRINGS` environment
/// variables at files holding canned tool output.
pub struct ToolchainBackend {
    name: &'static str,
    tools: ToolchainSpec,
}

impl ToolchainBackend {
    pub fn new(name: &'static str, tools: ToolchainSpec) -> Self {
        Self { name, tools }
    }

    pub fn binutils() -> Self {
        Self::new("binutils", ToolchainSpec { nm: "nm", objdump: "objdump", strings: "strings" })
    }

    pub fn llvm() -> Self {
        Self::new(
            "llvm",
            ToolchainSpec { nm: "llvm-nm", objdump: "llvm-objdump", strings: "llvm-strings" },
        )
    }
}

impl ExtractionBackend for ToolchainBackend {
    fn extract(&self, request: &ExtractRequest) -> Result<ArtifactSnapshot, ExtractError> {
        let path = &request.artifact_path;
        if !path.is_file() {
            return Err(ExtractError::MissingArtifact(path.clone()));
        }

        let bytes = fs::read(path)
            .map_err(|e| ExtractError::Tool(format!("failed to read {}: {e}", path.display())))?;

        let nm_output = tool_output("BP_FAKE_NM", self.tools.nm, &["-S"], path)?;
        let objdump_output = tool_output("BP_FAKE_OBJDUMP", self.tools.objdump, &["-d"], path)?;
        let strings_output = tool_output("BP_FAKE_STRINGS", self.tools.strings, &[], path)?;

        let name = path
            .file_name()
            .and_then(|os| os.to_str())
            .unwrap_or("artifact")
            .to_string();

        let mut snapshot = ArtifactSnapshot::new(name);
        snapshot.bytes = bytes;
        snapshot.symbols = parse_nm_output(&nm_output)?;
        snapshot.functions =
            parse_objdump_output(&objdump_output, request.max_instructions_per_function)?;
        snapshot.strings = strings_output.lines().map(str::to_string).collect();
        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Run one tool, or read the canned output the named env var points at.
fn tool_output(
    fake_env: &str,
    tool: &str,
    args: &[&str],
    path: &Path,
) -> Result<String, ExtractError> {
    if let Some(fake) = std::env::var_os(fake_env) {
        return fs::read_to_string(&fake)
            .map_err(|e| ExtractError::Tool(format!("failed to read {fake_env}: {e}")));
    }
    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| ExtractError::MissingTool(format!("{tool}: {e}")))?;
    if !output.status.success() {
        return Err(ExtractError::Tool(format!("{tool} exited with {}", output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `nm -S` style output.
///
/// Lines are `[address] [size] TYPE name` with address/size optional
/// (undefined symbols carry neither). Unrecognized lines are skipped
/// rather than fatal; `nm` interleaves warnings on stderr, not stdout,
/// so stdout noise is limited to blank lines and archive headers.
pub fn parse_nm_output(output: &str) -> Result<Vec<Symbol>, ExtractError> {
    let mut symbols = Vec::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (address, size, type_char, name) = match fields.as_slice() {
            [type_field, name] if type_field.len() == 1 => (None, None, type_field, name),
            [addr, type_field, name] if type_field.len() == 1 => {
                (parse_hex(addr), None, type_field, name)
            }
            [addr, size, type_field, name] if type_field.len() == 1 => {
                (parse_hex(addr), parse_hex(size), type_field, name)
            }
            _ => continue,
        };
        let code = type_char.chars().next().unwrap_or('?');
        if name.is_empty() {
            continue;
        }
        symbols.push(Symbol {
            name: name.to_string(),
            kind: kind_for(code),
            binding: binding_for(code),
            address,
            size,
            section: None,
        });
    }
    Ok(symbols)
}

fn parse_hex(text: &str) -> Option<u64> {
    u64::from_str_radix(text, 16).ok()
}

fn kind_for(code: char) -> SymbolKind {
    match code.to_ascii_uppercase() {
        'T' => SymbolKind::Function,
        'D' => SymbolKind::Data,
        'B' => SymbolKind::Bss,
        'R' => SymbolKind::ReadOnly,
        'C' => SymbolKind::Common,
        'U' => SymbolKind::Undefined,
        'W' | 'V' => SymbolKind::Weak,
        'A' => SymbolKind::Absolute,
        _ => SymbolKind::Other,
    }
}

fn binding_for(code: char) -> SymbolBinding {
    match code {
        'U' => SymbolBinding::Unknown,
        'W' | 'w' | 'V' | 'v' => SymbolBinding::Weak,
        c if c.is_ascii_uppercase() => SymbolBinding::Global,
        c if c.is_ascii_lowercase() => SymbolBinding::Local,
        _ => SymbolBinding::Unknown,
    }
}

/// Parse `objdump -d` style output into routine bodies.
///
/// Routine headers look like `0000000000001129 <name>:`; instruction
/// lines are tab-separated `address: raw-bytes  mnemonic operands`.
/// Ellipsis and blank lines are skipped. Duplicate routine names collapse
/// last-wins, matching the function-map contract.
pub fn parse_objdump_output(
    output: &str,
    max_instructions: Option<usize>,
) -> Result<FunctionMap, ExtractError> {
    let mut functions = FunctionMap::new();
    let mut current: Option<DisassembledFunction> = None;

    for line in output.lines() {
        if let Some(header) = parse_function_header(line) {
            if let Some(done) = current.take() {
                functions.insert(done.name.clone(), done);
            }
            current = Some(header);
            continue;
        }
        let Some(func) = current.as_mut() else { continue };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(ins) = parse_instruction_line(line) {
            let at_cap = max_instructions.is_some_and(|cap| func.instructions.len() >= cap);
            if !at_cap {
                func.instructions.push(ins);
            }
        }
    }
    if let Some(done) = current.take() {
        functions.insert(done.name.clone(), done);
    }

    if functions.is_empty() && output.contains('<') {
        // Headers present but nothing parsed means a dialect we do not
        // understand; refuse rather than hand back an empty map.
        return Err(ExtractError::Parse("no routine bodies recognized in disassembly".into()));
    }
    Ok(functions)
}

/// `0000000000001129 <_Z3addii>:` -> a fresh routine.
fn parse_function_header(line: &str) -> Option<DisassembledFunction> {
    let line = line.trim_end();
    let rest = line.strip_suffix(">:")?;
    let (addr_text, name) = rest.split_once(" <")?;
    let address = u64::from_str_radix(addr_text.trim(), 16).ok()?;
    if name.is_empty() {
        return None;
    }
    Some(DisassembledFunction::new(name, address))
}

/// `    1129:	f3 0f 1e fa 	endbr64` -> one instruction.
///
/// Continuation lines that carry only raw bytes (no mnemonic field) are
/// dropped; the bytes they spell belong to the preceding instruction and
/// never affect the comparison key.
fn parse_instruction_line(line: &str) -> Option<Instruction> {
    let mut parts = line.splitn(3, '\t');
    let addr_part = parts.next()?.trim();
    let bytes_part = parts.next()?.trim();
    let text_part = parts.next()?.trim();

    let address = u64::from_str_radix(addr_part.strip_suffix(':')?, 16).ok()?;
    if text_part.is_empty() || text_part == "..." {
        return None;
    }
    let (mnemonic, operands) = match text_part.split_once(char::is_whitespace) {
        Some((m, ops)) => (m.to_string(), ops.trim().to_string()),
        None => (text_part.to_string(), String::new()),
    };
    Some(Instruction::new(address, bytes_part, mnemonic, operands, line.trim_end()))
}
