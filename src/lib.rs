//! Torth compiler library.
//!
//! Compiles Torth source to x86-64 NASM assembly for Linux and delegates
//! assembling and linking to `nasm` and `gcc`. The pipeline:
//!
//! 1. resolve `include "name"` directives into one source text
//! 2. lex into tokens
//! 3. parse function and memory definitions
//! 4. inline every call starting from `main` (recursion is rejected first)
//! 5. build the linear op program
//! 6. type/stack check
//! 7. emit assembly and clean unused defines
//!
//! The front-end (`compile_source`) is pure text-to-text and needs no
//! external tools; `compile_file` drives the full build.

pub mod ast;
pub mod call_graph;
pub mod codegen;
pub mod config;
pub mod error;
pub mod inliner;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod resolver;
pub mod typechecker;

pub use ast::{Constant, Function, Intrinsic, Memory, Op, OpType, Program, Signature};
pub use config::CompilerConfig;
pub use error::{CompileResult, CompilerError, ErrorKind};
pub use lexer::{Keyword, Location, Token, TokenType};
pub use resolver::Resolver;
pub use typechecker::TypeChecker;

use std::path::{Path, PathBuf};
use std::process::Command;

/// Failure of a full build: a compiler diagnostic, an I/O problem, or an
/// external tool exiting non-zero.
#[derive(Debug)]
pub enum BuildError {
    Compile(CompilerError),
    Io(String),
    Tool {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },
}

impl BuildError {
    /// Process exit code for this failure. Compiler and I/O errors exit 1;
    /// assembler/linker exit codes surface unchanged.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Compile(_) | BuildError::Io(_) => 1,
            BuildError::Tool { code, .. } => code.unwrap_or(1),
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Compile(e) => write!(f, "{}", e),
            BuildError::Io(message) => write!(f, "{}", message),
            BuildError::Tool { tool, code, stderr } => {
                write!(f, "{} failed", tool)?;
                if let Some(code) = code {
                    write!(f, " with exit code {}", code)?;
                }
                if !stderr.is_empty() {
                    write!(f, ":\n{}", stderr)?;
                }
                Ok(())
            }
        }
    }
}

impl From<CompilerError> for BuildError {
    fn from(e: CompilerError) -> Self {
        BuildError::Compile(e)
    }
}

impl std::error::Error for BuildError {}

/// Compile source text to assembly.
///
/// `file_name` is the display name used in diagnostics and per-op
/// comments. Includes are searched in the configured include paths.
pub fn compile_source(
    source: &str,
    file_name: &str,
    config: &CompilerConfig,
) -> CompileResult<String> {
    let mut resolver = Resolver::new(config.include_paths.clone());
    let expanded = resolver.expand_text(source)?;
    compile_expanded(&expanded, file_name, config)
}

/// Compile a source file to assembly text.
pub fn compile_to_asm(input: &Path, config: &CompilerConfig) -> Result<String, BuildError> {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut resolver = Resolver::new(config.search_paths_for(input));
    let expanded = resolver.expand_file(input)?;
    Ok(compile_expanded(&expanded, &file_name, config)?)
}

/// The front-end proper: expanded text in, assembly out.
fn compile_expanded(
    expanded: &str,
    file_name: &str,
    config: &CompilerConfig,
) -> CompileResult<String> {
    let tokens = lexer::tokenize(expanded, file_name)?;
    let parsed = parser::parse(&tokens)?;
    let flat = inliner::inline_program(&parsed.functions)?;
    let program = program::build_program(&flat, &parsed.memories, &config.constants)?;
    typechecker::check_program(&program)?;
    codegen::generate_asm(&program, &config.constants, &parsed.memories)
}

/// Compile a source file to an executable.
///
/// Writes `input.asm` next to the input, assembles it with
/// `nasm -felf64`, links with `gcc -no-pie`, removes the object file, and
/// removes the assembly unless `save_asm` is set.
pub fn compile_file(
    input: &Path,
    output: &Path,
    save_asm: bool,
    config: &CompilerConfig,
) -> Result<(), BuildError> {
    let asm = compile_to_asm(input, config)?;

    let asm_path = input.with_extension("asm");
    let obj_path = input.with_extension("o");
    std::fs::write(&asm_path, asm).map_err(|e| {
        BuildError::Io(format!("Failed to write {}: {}", asm_path.display(), e))
    })?;

    let result = assemble_and_link(&asm_path, &obj_path, output);

    // The object file is a build artifact either way; the assembly is kept
    // only on request.
    std::fs::remove_file(&obj_path).ok();
    if !save_asm {
        std::fs::remove_file(&asm_path).ok();
    }
    result
}

fn assemble_and_link(asm_path: &Path, obj_path: &Path, output: &Path) -> Result<(), BuildError> {
    run_tool(
        "nasm",
        Command::new("nasm")
            .arg("-felf64")
            .arg("-o")
            .arg(obj_path)
            .arg(asm_path),
    )?;
    run_tool(
        "gcc",
        Command::new("gcc")
            .arg("-no-pie")
            .arg("-o")
            .arg(output)
            .arg(obj_path),
    )
}

fn run_tool(tool: &'static str, command: &mut Command) -> Result<(), BuildError> {
    let output = command
        .output()
        .map_err(|e| BuildError::Io(format!("Failed to run {}: {}", tool, e)))?;
    if !output.status.success() {
        return Err(BuildError::Tool {
            tool,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Default output path for an input: the file stem in the current
/// directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    PathBuf::from(input.file_stem().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> CompileResult<String> {
        compile_source(source, "test.torth", &CompilerConfig::default())
    }

    #[test]
    fn test_scenario_add_and_print() {
        let asm = compile("function main -- : 34 35 + print end").unwrap();
        assert!(asm.contains("  mov rax, 34"));
        assert!(asm.contains("  mov rax, 35"));
        assert!(asm.contains("  add rax, rbx"));
        assert!(asm.contains("  call print"));
    }

    #[test]
    fn test_scenario_hello_world() {
        let asm = compile("function main -- : \"Hello, World!\\n\" puts end").unwrap();
        assert!(asm.contains("db \"Hello, World!\",10,0"));
        assert!(asm.contains("repnz scasb"));
    }

    #[test]
    fn test_scenario_count_to_five() {
        let asm = compile("function main -- : 0 while dup 5 < do dup print 1 + done drop end")
            .unwrap();
        assert!(asm.contains("WHILE1:"));
        assert!(asm.contains("  cmovl rcx, rdx"));
        assert!(asm.contains("  jz DONE10"));
    }

    #[test]
    fn test_scenario_if_else() {
        let asm = compile(
            "function main -- : 7 if dup 0 > do \"pos\\n\" puts else \"non-pos\\n\" puts endif drop end",
        )
        .unwrap();
        assert!(asm.contains("  jz ELSE8"));
        assert!(asm.contains("ENDIF11:"));
    }

    #[test]
    fn test_scenario_rot() {
        let asm = compile("function main -- : 1 2 3 rot print print print end").unwrap();
        assert!(asm.contains(";; -- INTRINSIC rot"));
        assert!(asm.contains("  pop rcx"));
    }

    #[test]
    fn test_scenario_function_inlining() {
        let asm =
            compile("function f -- INT : 21 2 * end function main -- : f print end").unwrap();
        assert!(asm.contains("  mov rax, 21"));
        assert!(asm.contains("  mul rbx"));
        assert!(asm.contains("  call print"));
    }

    #[test]
    fn test_empty_main_compiles_to_bare_skeleton() {
        let asm = compile("function main -- : end").unwrap();
        assert!(asm.contains("_start:"));
        assert!(asm.contains("  mov rax, sys_exit"));
    }

    #[test]
    fn test_single_op_main() {
        let asm = compile("function main -- : 0 drop end").unwrap();
        assert!(asm.contains("  mov rax, 0"));
        assert!(asm.contains("  add rsp, 8"));
    }

    #[test]
    fn test_error_surfaces_from_every_stage() {
        let unknown = compile("function main -- : frobnicate end").unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::UnknownWord);

        let missing_main = compile("function f -- : end").unwrap_err();
        assert_eq!(missing_main.kind, ErrorKind::MissingMainFunction);

        let underflow = compile("function main -- : drop end").unwrap_err();
        assert_eq!(underflow.kind, ErrorKind::PopFromEmptyStack);

        let recursion =
            compile("function f -- : f end function main -- : f end").unwrap_err();
        assert_eq!(recursion.kind, ErrorKind::RecursiveFunction);
    }

    #[test]
    fn test_build_error_exit_codes() {
        let compile_err = BuildError::Compile(CompilerError::new(
            ErrorKind::UnknownError,
            "boom",
        ));
        assert_eq!(compile_err.exit_code(), 1);
        let tool_err = BuildError::Tool {
            tool: "nasm",
            code: Some(3),
            stderr: String::new(),
        };
        assert_eq!(tool_err.exit_code(), 3);
    }

    #[test]
    fn test_default_output_path_strips_extension() {
        assert_eq!(
            default_output_path(Path::new("dir/program.torth")),
            PathBuf::from("program")
        );
    }
}
