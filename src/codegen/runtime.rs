//! Runtime surface: the external symbols Mini programs call into, and the
//! fixed header/data boilerplate every generated file starts with
//! (spec.md §4.3.1, §4.3.3).

use crate::ast::Program;
use crate::codegen::state::CodeGen;

pub(super) const MALLOC: &str = "malloc";
pub(super) const FREE: &str = "free";
pub(super) const PRINT_INT: &str = "print_int";
pub(super) const PRINT_CHAR: &str = "print_char";
pub(super) const READ_INT: &str = "read_int";
pub(super) const EXIT: &str = "exit";

/// `.globl main` plus the two runtime-helper imports every Mini binary
/// links against.
pub(super) fn emit_header(cg: &mut CodeGen) {
    cg.emit_raw(".globl main");
    cg.emit_raw(".import berkeley_utils.s");
    cg.emit_raw(".import read_int.s");
}

/// The `.data` section: one reserved word for `input_file_ptr` (`main`'s
/// stashed `argv[1]`), followed by one zero-initialized word per global
/// declaration, in source order.
pub(super) fn emit_data_section(cg: &mut CodeGen, program: &Program) {
    cg.emit_raw(".data");
    cg.emit_raw("input_file_ptr: .word 0");
    for decl in &program.declarations {
        cg.emit_raw(format!("{}: .word 0", decl.name));
    }
}
