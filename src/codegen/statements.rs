//! Statement dispatch (spec.md §4.3.4 cursor reset, §4.3.5, §4.3.7) and the
//! `println`/`print`/`delete` rules.

use crate::ast::{LValue, Stmt};
use crate::codegen::runtime::{FREE, PRINT_CHAR, PRINT_INT};
use crate::codegen::state::{CodeGen, FunctionLayout};

impl CodeGen {
    pub(super) fn gen_stmt(&mut self, stmt: &Stmt, layout: &FunctionLayout) {
        self.reset_temp_cursor();
        match stmt {
            Stmt::Assignment { target, source, .. } => self.gen_assignment(target, source, layout),
            Stmt::Block { stmts, .. } => {
                for s in stmts {
                    self.gen_stmt(s, layout);
                }
            }
            Stmt::Conditional { guard, then_branch, else_branch, .. } => {
                self.gen_conditional(guard, then_branch, else_branch, layout)
            }
            Stmt::While { guard, body, .. } => self.gen_while(guard, body, layout),
            Stmt::Delete { expr, .. } => {
                self.gen_expr(expr, layout);
                self.emit(format!("jal ra, {FREE}"));
            }
            Stmt::InvocationStmt { expr, .. } => self.gen_expr(expr, layout),
            Stmt::Print { expr, .. } => {
                self.gen_expr(expr, layout);
                self.emit(format!("jal ra, {PRINT_INT}"));
            }
            Stmt::PrintLn { expr, .. } => {
                self.gen_expr(expr, layout);
                self.emit(format!("jal ra, {PRINT_INT}"));
                self.emit("li a0, 10");
                self.emit(format!("jal ra, {PRINT_CHAR}"));
            }
            Stmt::Return { expr, .. } => {
                self.gen_expr(expr, layout);
                self.emit(format!("j {}_epilog", self.current_function_name()));
            }
            Stmt::ReturnEmpty { .. } => {
                self.emit(format!("j {}_epilog", self.current_function_name()));
            }
        }
    }

    fn gen_assignment(&mut self, target: &LValue, source: &crate::ast::Expr, layout: &FunctionLayout) {
        match target {
            LValue::Id { name, .. } => {
                self.gen_expr(source, layout);
                self.gen_store_variable(name, layout);
            }
            LValue::Dot { .. } => {
                self.gen_lvalue_address(target, layout);
                let addr = self.next_temp();
                self.emit(format!("mv {addr}, a0"));
                self.gen_expr(source, layout);
                self.emit(format!("sw a0, 0({addr})"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_program;

    #[test]
    fn println_prints_the_value_then_a_newline() {
        let program = parse_program("fun main() int { println 1 + 2; return 0; }").unwrap();
        let text = crate::codegen::generate(&program);
        let print_int_idx = text.find("jal ra, print_int").unwrap();
        let newline_idx = text.find("li a0, 10").unwrap();
        assert!(newline_idx > print_int_idx);
        assert!(text.contains("jal ra, print_char"));
    }

    #[test]
    fn delete_frees_the_evaluated_pointer() {
        let src = "struct P { int x; } fun main() int { struct P p; p = new P; delete p; return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("jal ra, free"));
    }
}
