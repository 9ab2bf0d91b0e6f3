//! Compilation driver (spec.md §4.4).
//!
//! Wires the parser adapter, analyzer, and code generator into the single
//! pipeline the CLI drives: parse, analyze, and — only if the analyzer
//! found nothing — generate and write assembly next to the source file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::analyzer;
use crate::codegen;
use crate::parser;

#[derive(Debug)]
pub enum DriverError {
    Io(std::io::Error),
    Syntax,
    SemanticErrors(usize),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "I/O error: {e}"),
            DriverError::Syntax => write!(f, "Syntax errors."),
            DriverError::SemanticErrors(n) => write!(f, "ERRORS FOUND {n}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

/// Where the compiled output was written, and whether an AST dump was
/// also written alongside it (`--keep-ast`).
#[derive(Debug)]
pub struct CompileOutcome {
    pub assembly_path: PathBuf,
    pub ast_path: Option<PathBuf>,
}

/// Replace a `.mini` extension with `.s`; if the input has no `.mini`
/// extension, append `.s` to the full file name instead.
fn output_path_for(input: &Path) -> PathBuf {
    if input.extension().and_then(|e| e.to_str()) == Some("mini") {
        input.with_extension("s")
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".s");
        PathBuf::from(name)
    }
}

fn ast_dump_path_for(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".ast");
    PathBuf::from(name)
}

/// Run the full pipeline over the file at `input_path`.
///
/// On success, the assembly has already been written to disk; on
/// semantic failure, every defect has already been printed to stdout
/// (spec.md §6) before the error is returned.
#[instrument(skip_all, fields(path = %input_path.display()))]
pub fn compile_file(input_path: &Path, keep_ast: bool) -> Result<CompileOutcome, DriverError> {
    let source = fs::read_to_string(input_path)?;

    let program = {
        let _span = tracing::info_span!("parse").entered();
        parser::parse_program(&source).map_err(|_| DriverError::Syntax)?
    };
    println!("Parse successful.");
    info!("parse successful");

    let ast_path = if keep_ast {
        let path = ast_dump_path_for(input_path);
        fs::write(&path, format!("{program:#?}"))?;
        Some(path)
    } else {
        None
    };

    let result = {
        let _span = tracing::info_span!("analyze").entered();
        analyzer::analyze(&program)
    };
    let error_count = result.print_report();
    if error_count > 0 {
        return Err(DriverError::SemanticErrors(error_count));
    }

    let assembly = {
        let _span = tracing::info_span!("codegen").entered();
        codegen::generate(&program)
    };
    let assembly_path = output_path_for(input_path);
    fs::write(&assembly_path, assembly)?;
    info!(path = %assembly_path.display(), "assembly written");

    Ok(CompileOutcome { assembly_path, ast_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &tempfile::TempDir, name: &str, src: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(src.as_bytes()).unwrap();
        path
    }

    #[test]
    fn well_formed_program_produces_an_assembly_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "ok.mini", "fun main() int { println 1; return 0; }");
        let outcome = compile_file(&path, false).unwrap();
        assert_eq!(outcome.assembly_path, dir.path().join("ok.s"));
        assert!(outcome.assembly_path.exists());
        let text = fs::read_to_string(&outcome.assembly_path).unwrap();
        assert!(text.contains(".globl main"));
    }

    #[test]
    fn program_with_semantic_errors_is_rejected_without_writing_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "bad.mini", "fun main() bool { return true; }");
        let err = compile_file(&path, false).unwrap_err();
        assert!(matches!(err, DriverError::SemanticErrors(1)));
        assert!(!dir.path().join("bad.s").exists());
    }

    #[test]
    fn syntactically_invalid_source_reports_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "broken.mini", "fun main( int {");
        let err = compile_file(&path, false).unwrap_err();
        assert!(matches!(err, DriverError::Syntax));
    }

    #[test]
    fn keep_ast_writes_a_sibling_dump_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "ok.mini", "fun main() int { return 0; }");
        let outcome = compile_file(&path, true).unwrap();
        let ast_path = outcome.ast_path.unwrap();
        assert!(ast_path.exists());
    }
}
