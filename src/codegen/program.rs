//! Program assembly and function prologue/epilogue (spec.md §4.3.1–§4.3.3).

use crate::ast::{Function, Program};
use crate::codegen::layout::{build_function_layout, build_function_return_structs, build_struct_layout};
use crate::codegen::runtime::{emit_data_section, emit_header, EXIT};
use crate::codegen::state::CodeGen;

const ARG_REGS: [&str; 8] = ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"];

pub(super) fn build(program: &Program) -> CodeGen {
    let mut cg = CodeGen::new();
    cg.struct_layout = build_struct_layout(program);
    cg.function_return_structs = build_function_return_structs(program);

    emit_header(&mut cg);
    emit_data_section(&mut cg, program);
    cg.emit_raw(".text");

    for func in &program.functions {
        emit_function(&mut cg, func);
    }

    cg
}

fn emit_function(cg: &mut CodeGen, func: &Function) {
    let layout = build_function_layout(func);
    let frame_size = layout.frame_size();
    cg.set_current_function_name(&func.name);

    cg.emit_label(&func.name);
    cg.emit(format!("addi sp, sp, -{frame_size}"));
    cg.emit(format!("sw ra, {}(sp)", frame_size - 4));
    cg.emit(format!("sw fp, {}(sp)", frame_size - 8));
    cg.emit(format!("addi fp, sp, {frame_size}"));

    if func.name == "main" {
        cg.emit("lw a0, 4(a1)");
        cg.emit("la a1, input_file_ptr");
        cg.emit("sw a0, 0(a1)");
    }

    for (i, param) in func.params.iter().enumerate() {
        let offset = layout.offsets[&param.name];
        if i < 8 {
            cg.emit(format!("sw {}, {offset}(fp)", ARG_REGS[i]));
        } else {
            let stack_offset = 4 * (i - 8);
            let temp = cg.next_temp();
            cg.emit(format!("lw {temp}, {stack_offset}(fp)"));
            cg.emit(format!("sw {temp}, {offset}(fp)"));
        }
    }
    cg.reset_temp_cursor();

    for stmt in &func.body {
        cg.gen_stmt(stmt, &layout);
    }

    cg.emit_label(&format!("{}_epilog", func.name));
    cg.emit(format!("lw ra, {}(sp)", frame_size - 4));
    cg.emit(format!("lw fp, {}(sp)", frame_size - 8));
    cg.emit(format!("addi sp, sp, {frame_size}"));
    if func.name == "main" {
        cg.emit("li a0, 0");
        cg.emit(format!("jal zero, {EXIT}"));
    } else {
        cg.emit("ret");
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_program;

    #[test]
    fn main_frame_size_accounts_for_params_and_locals() {
        let program = parse_program("fun main() int { int x; int y; return 0; }").unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("addi sp, sp, -16"));
    }

    #[test]
    fn main_stashes_argv_into_input_file_ptr() {
        let program = parse_program("fun main() int { return 0; }").unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("lw a0, 4(a1)"));
        assert!(text.contains("sw a0, 0(a1)"));
    }

    #[test]
    fn non_main_function_returns_via_ret_not_exit() {
        let program = parse_program("fun f() void { return; } fun main() int { f(); return 0; }").unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("f_epilog:"));
        let epilog_idx = text.find("f_epilog:").unwrap();
        assert!(text[epilog_idx..].contains("ret"));
    }
}
