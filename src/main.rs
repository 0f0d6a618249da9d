//! Torth compiler CLI.
//!
//! Compiles a `.torth` source file to an x86-64 Linux executable via
//! `nasm` and `gcc`.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;
use torthc::CompilerConfig;

#[derive(Parser)]
#[command(name = "torth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Torth compiler - compile .torth programs to executables", long_about = None)]
struct Cli {
    /// Input .torth source file
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output executable path (defaults to the input filename without .torth)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the intermediate assembly file (.asm)
    #[arg(long)]
    save_asm: bool,

    /// Additional include search paths, tried before the defaults
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    include_paths: Vec<PathBuf>,

    /// Configuration file (defaults to torth.toml next to the input)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate shell completion scripts and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "torth", &mut io::stdout());
        return;
    }

    // clap guarantees the input is present when not generating completions.
    let input = cli.input.expect("input is required");
    let output = cli
        .output
        .unwrap_or_else(|| torthc::default_output_path(&input));

    let mut config = match load_config(&cli.config, &input) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };
    // Command-line include paths are searched before configured ones.
    config.include_paths.splice(0..0, cli.include_paths);

    match torthc::compile_file(&input, &output, cli.save_asm, &config) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
            if cli.save_asm {
                println!("Assembly saved to {}", input.with_extension("asm").display());
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

/// Load the configuration: an explicit `--config` file must exist, a
/// `torth.toml` next to the input is picked up when present.
fn load_config(
    explicit: &Option<PathBuf>,
    input: &std::path::Path,
) -> Result<CompilerConfig, String> {
    if let Some(path) = explicit {
        return CompilerConfig::from_file(path);
    }
    let default_path = input
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("torth.toml");
    if default_path.is_file() {
        return CompilerConfig::from_file(&default_path);
    }
    Ok(CompilerConfig::default())
}
