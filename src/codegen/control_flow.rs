//! If/while emission (spec.md §4.3.6).

use crate::ast::Stmt;
use crate::codegen::state::{CodeGen, FunctionLayout};

impl CodeGen {
    pub(super) fn gen_conditional(
        &mut self,
        guard: &crate::ast::Expr,
        then_branch: &Stmt,
        else_branch: &Stmt,
        layout: &FunctionLayout,
    ) {
        let else_label = self.fresh_label("else");
        let end_label = self.fresh_label("endif");

        self.gen_expr(guard, layout);
        self.emit(format!("beqz a0, {else_label}"));
        self.gen_stmt(then_branch, layout);
        self.emit(format!("j {end_label}"));
        self.emit_label(&else_label);
        self.gen_stmt(else_branch, layout);
        self.emit_label(&end_label);
    }

    pub(super) fn gen_while(&mut self, guard: &crate::ast::Expr, body: &Stmt, layout: &FunctionLayout) {
        let start_label = self.fresh_label("while_start");
        let end_label = self.fresh_label("while_end");

        self.emit_label(&start_label);
        self.gen_expr(guard, layout);
        self.emit(format!("beqz a0, {end_label}"));
        self.gen_stmt(body, layout);
        self.emit(format!("j {start_label}"));
        self.emit_label(&end_label);
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_program;

    #[test]
    fn while_loop_emits_matching_start_and_end_labels() {
        let src = "fun main() int { int x; x = 0; while (x < 3) { x = x + 1; } return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("while_start_0:"));
        assert!(text.contains("while_end_0:"));
    }

    #[test]
    fn conditional_without_else_still_emits_an_empty_else_block() {
        let src = "fun main() int { if (true) { println 1; } return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("else_0:"));
        assert!(text.contains("endif_0:"));
    }
}
