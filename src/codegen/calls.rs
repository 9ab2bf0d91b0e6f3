//! Function call codegen (spec.md §4.3.4, invocation rule).
//!
//! Arguments are staged through a save area on the stack rather than
//! straight into `a0..a7`, so evaluating argument `i` never clobbers an
//! already-evaluated argument `j` sitting in a register.

use crate::ast::Expr;
use crate::codegen::state::{CodeGen, FunctionLayout};

const ARG_REGS: [&str; 8] = ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"];

impl CodeGen {
    pub(super) fn gen_invocation(&mut self, name: &str, args: &[Expr], layout: &FunctionLayout) {
        let n = args.len();
        if n > 0 {
            self.emit(format!("addi sp, sp, -{}", 4 * n));
        }

        // Argument 0 ends up at the highest offset in the save area.
        for (i, arg) in args.iter().enumerate() {
            self.gen_expr(arg, layout);
            let offset = 4 * (n - 1 - i);
            self.emit(format!("sw a0, {offset}(sp)"));
        }

        let register_args = n.min(8);
        for (i, reg) in ARG_REGS.iter().take(register_args).enumerate() {
            let offset = 4 * (n - 1 - i);
            self.emit(format!("lw {reg}, {offset}(sp)"));
        }

        if n > 8 {
            // The register args (indices 0..7) occupy the top 8 words of
            // the save area (offsets 4*(n-9)+4 .. 4*(n-1)) and are already
            // loaded into a0..a7, so those words are free. Stack args
            // (indices 8..n-1) occupy the bottom words (offsets 0..4*(n-9))
            // and must end up at 0, 4, ... measured from sp *after* the
            // 32-byte shrink below. Read every stack-arg value into a temp
            // before the shrink (bounded by the 7-entry temp pool — calls
            // with more than 7 stack-spilled arguments aren't supported),
            // then store each at its post-shrink offset.
            let stack_args = n - 8;
            let mut values = Vec::with_capacity(stack_args);
            for j in 0..stack_args {
                let source_offset = 4 * (n - 9 - j);
                let temp = self.next_temp();
                self.emit(format!("lw {temp}, {source_offset}(sp)"));
                values.push(temp);
            }
            self.emit(format!("addi sp, sp, {}", 4 * 8));
            for (j, temp) in values.into_iter().enumerate() {
                self.emit(format!("sw {temp}, {}(sp)", 4 * j));
            }
            self.emit(format!("jal ra, {name}"));
            self.emit(format!("addi sp, sp, {}", 4 * stack_args));
        } else {
            if n > 0 {
                self.emit(format!("addi sp, sp, {}", 4 * n));
            }
            self.emit(format!("jal ra, {name}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn call_with_nine_arguments_spills_one_onto_the_stack() {
        let src = "fun f(int a,int b,int c,int d,int e,int g,int h,int i,int j) int { return a; } \
                   fun main() int { int r; r = f(1,2,3,4,5,6,7,8,9); return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("jal ra, f"));
        assert!(text.contains("addi sp, sp, -36"));
    }

    /// Ninth argument's value, stored at `0(sp)` before the shrink, must be
    /// relocated to `0(sp)` *measured from the post-shrink sp* — i.e. to
    /// `32(sp)` in the pre-shrink frame — before the 32-byte shrink runs,
    /// so the callee's `lw a0, 0(fp)`-style read of its 9th parameter sees
    /// the value the caller actually passed, not a stale register slot.
    #[test]
    fn ninth_argument_is_relocated_to_the_post_shrink_stack_slot_before_the_shrink() {
        let src = "fun f(int a,int b,int c,int d,int e,int g,int h,int i,int j) int { return a; } \
                   fun main() int { int r; r = f(1,2,3,4,5,6,7,8,9); return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        let load_idx = lines.iter().position(|l| *l == "lw t0, 0(sp)").expect("relocating load missing");
        let shrink_idx = lines.iter().position(|l| *l == "addi sp, sp, 32").expect("shrink missing");
        let store_idx = lines.iter().position(|l| *l == "sw t0, 0(sp)").expect("relocating store missing");
        let call_idx = lines.iter().position(|l| *l == "jal ra, f").expect("call missing");
        let reclaim_idx = lines.iter().position(|l| *l == "addi sp, sp, 4").expect("reclaim missing");

        assert!(load_idx < shrink_idx, "must read the old slot before it moves out from under sp");
        assert!(shrink_idx < store_idx, "must store at the post-shrink offset, not the pre-shrink one");
        assert!(store_idx < call_idx, "stack arg must be in place before the call");
        assert!(call_idx < reclaim_idx, "stack space is reclaimed only after the call returns");
    }
}
