use std::path::PathBuf;
use std::process;

use clap::Parser;

use minic::driver::{self, DriverError};

/// Compiler for the Mini language, emitting RISC-V-style assembly.
#[derive(Parser, Debug)]
#[command(name = "minic", version, about)]
struct Cli {
    /// Path to a .mini source file.
    input: PathBuf,

    /// Write the assembly here instead of the default `<input>.s` sibling.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also dump the parsed AST to `<input>.ast`, for debugging.
    #[arg(long)]
    keep_ast: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match driver::compile_file(&cli.input, cli.keep_ast) {
        Ok(outcome) => {
            let final_path = match cli.output {
                Some(dest) => {
                    if let Err(e) = std::fs::rename(&outcome.assembly_path, &dest) {
                        eprintln!("failed to move output to {}: {e}", dest.display());
                        process::exit(1);
                    }
                    dest
                }
                None => outcome.assembly_path,
            };
            println!("Assembly code generated in {}", final_path.display());
        }
        Err(DriverError::Syntax) => {
            println!("Syntax errors.");
            process::exit(1);
        }
        Err(DriverError::SemanticErrors(_)) => {
            // Per-error lines and the `ERRORS FOUND N` summary were already
            // printed by the analyzer; nothing left to add here.
            process::exit(1);
        }
        Err(DriverError::Io(e)) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
