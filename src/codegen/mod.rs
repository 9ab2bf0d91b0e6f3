//! Code generator for Mini.
//!
//! Syntax-directed translation from an (already analyzed) AST straight to
//! RISC-V-style assembly text. Codegen assumes well-typedness and never
//! consults the analyzer's symbol table — it rebuilds the much smaller
//! layout information it needs (`layout.rs`) directly from the AST, so the
//! two passes stay decoupled and either can be tested in isolation.
//!
//! Module layout:
//! - `state.rs` — the `CodeGen` buffer, label/temp counters, and the
//!   struct/function layout tables.
//! - `layout.rs` — struct field offsets/sizes and per-function slot
//!   assignment, computed fresh from the AST.
//! - `runtime.rs` — the fixed header/data boilerplate and runtime symbol
//!   names.
//! - `program.rs` — top-level assembly and per-function prologue/epilogue.
//! - `statements.rs` — statement dispatch, `println`/`print`/`delete`.
//! - `control_flow.rs` — `if`/`while` emission.
//! - `expr.rs` — expression evaluation, including the best-effort struct
//!   type derivation `Dot` needs for its field offset.
//! - `lvalue.rs` — assignment targets and address computation.
//! - `calls.rs` — invocation codegen, including the >8-argument spill path.
//! - `peephole.rs` — the post-pass cleanup over the emitted line buffer.

mod calls;
mod control_flow;
mod expr;
mod layout;
mod lvalue;
mod peephole;
mod program;
mod runtime;
mod state;
mod statements;

use crate::ast::Program;

pub use state::{FunctionLayout, StructLayout};

/// Generate the full assembly text for `program`, peephole-optimized.
pub fn generate(program: &Program) -> String {
    let cg = program::build(program);
    let lines = peephole::run(cg.take_lines());
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn generates_a_runnable_hello_world() {
        let program = parse_program("fun main() int { println 42; return 0; }").unwrap();
        let text = generate(&program);
        assert!(text.starts_with(".globl main"));
        assert!(text.contains("main:"));
        assert!(text.contains("li a0, 42"));
        assert!(text.contains("jal ra, print_int"));
        assert!(text.contains("jal zero, exit"));
    }

    #[test]
    fn globals_get_one_zero_word_each_in_declaration_order() {
        let program = parse_program("int x; int y; fun main() int { return 0; }").unwrap();
        let text = generate(&program);
        let x_idx = text.find("x: .word 0").unwrap();
        let y_idx = text.find("y: .word 0").unwrap();
        assert!(x_idx < y_idx);
    }

    #[test]
    fn struct_field_access_round_trips_through_new_and_dot() {
        let src = "struct P { int x; int y; } \
                   fun main() int { struct P p; p = new P; p.y = 5; println p.y; return 0; }";
        let program = parse_program(src).unwrap();
        let text = generate(&program);
        assert!(text.contains("li a0, 8")); // size_of(P) = 4*2
        assert!(text.contains("addi a0, a0, 4")); // offset of field y
    }
}
