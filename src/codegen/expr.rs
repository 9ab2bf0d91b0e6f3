//! Expression evaluation (spec.md §4.3.4).
//!
//! Every rule here leaves its result in `a0`. Binary operators spill
//! their left operand into the next temporary from the rotating pool
//! rather than the stack, so the cursor reset at the top of each
//! statement (see `codegen::state`) is what keeps temps from colliding
//! across separate expressions in the same statement.

use crate::ast::Expr;
use crate::codegen::runtime::{MALLOC, READ_INT};
use crate::codegen::state::{CodeGen, FunctionLayout};
use crate::ops::{BinaryOp, UnaryOp};

impl CodeGen {
    pub(super) fn gen_expr(&mut self, expr: &Expr, layout: &FunctionLayout) {
        match expr {
            Expr::Integer { value, .. } => self.emit(format!("li a0, {value}")),
            Expr::True { .. } => self.emit("li a0, 1"),
            Expr::False { .. } | Expr::Null { .. } => self.emit("li a0, 0"),
            Expr::Identifier { name, .. } => self.gen_load_variable(name, layout),
            Expr::New { struct_name, .. } => {
                let size = self.struct_layout.size_of(struct_name).unwrap_or(0);
                self.emit(format!("li a0, {size}"));
                self.emit(format!("jal ra, {MALLOC}"));
            }
            Expr::Read { .. } => {
                self.emit("la a0, input_file_ptr");
                self.emit("lw a0, 0(a0)");
                self.emit(format!("jal ra, {READ_INT}"));
            }
            Expr::Dot { left, field, .. } => {
                self.gen_expr(left, layout);
                let struct_name = self.derive_struct_type(left, layout);
                let offset = struct_name
                    .as_deref()
                    .and_then(|s| self.struct_layout.field_offset(s, field))
                    .unwrap_or(0);
                self.emit(format!("lw a0, {offset}(a0)"));
            }
            Expr::Unary { op, operand, .. } => {
                self.gen_expr(operand, layout);
                match op {
                    UnaryOp::Minus => self.emit("neg a0, a0"),
                    UnaryOp::Not => self.emit("seqz a0, a0"),
                }
            }
            Expr::Binary { op, left, right, .. } => self.gen_binary(*op, left, right, layout),
            Expr::Invocation { name, args, .. } => self.gen_invocation(name, args, layout),
        }
    }

    fn gen_load_variable(&mut self, name: &str, layout: &FunctionLayout) {
        match layout.offsets.get(name) {
            Some(offset) => self.emit(format!("lw a0, {offset}(fp)")),
            None => {
                self.emit(format!("la a0, {name}"));
                self.emit("lw a0, 0(a0)");
            }
        }
    }

    fn gen_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, layout: &FunctionLayout) {
        if op == BinaryOp::And {
            return self.gen_short_circuit_and(left, right, layout);
        }
        if op == BinaryOp::Or {
            return self.gen_short_circuit_or(left, right, layout);
        }

        self.gen_expr(left, layout);
        let temp = self.next_temp();
        self.emit(format!("mv {temp}, a0"));
        self.gen_expr(right, layout);

        match op {
            BinaryOp::Mul => self.emit(format!("mul a0, {temp}, a0")),
            BinaryOp::Div => self.emit(format!("div a0, {temp}, a0")),
            BinaryOp::Add => self.emit(format!("add a0, {temp}, a0")),
            BinaryOp::Sub => self.emit(format!("sub a0, {temp}, a0")),
            BinaryOp::Lt => self.emit(format!("slt a0, {temp}, a0")),
            BinaryOp::Gt => self.emit(format!("slt a0, a0, {temp}")),
            BinaryOp::Le => {
                self.emit(format!("slt a0, a0, {temp}"));
                self.emit("xori a0, a0, 1");
            }
            BinaryOp::Ge => {
                self.emit(format!("slt a0, {temp}, a0"));
                self.emit("xori a0, a0, 1");
            }
            BinaryOp::Eq => {
                self.emit(format!("sub a0, {temp}, a0"));
                self.emit("seqz a0, a0");
            }
            BinaryOp::Ne => {
                self.emit(format!("sub a0, {temp}, a0"));
                self.emit("snez a0, a0");
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn gen_short_circuit_and(&mut self, left: &Expr, right: &Expr, layout: &FunctionLayout) {
        let false_label = self.fresh_label("and_false");
        let end_label = self.fresh_label("and_end");
        self.gen_expr(left, layout);
        self.emit(format!("beqz a0, {false_label}"));
        self.gen_expr(right, layout);
        self.emit("snez a0, a0");
        self.emit(format!("j {end_label}"));
        self.emit_label(&false_label);
        self.emit("li a0, 0");
        self.emit_label(&end_label);
    }

    fn gen_short_circuit_or(&mut self, left: &Expr, right: &Expr, layout: &FunctionLayout) {
        let true_label = self.fresh_label("or_true");
        let end_label = self.fresh_label("or_end");
        self.gen_expr(left, layout);
        self.emit(format!("bnez a0, {true_label}"));
        self.gen_expr(right, layout);
        self.emit("snez a0, a0");
        self.emit(format!("j {end_label}"));
        self.emit_label(&true_label);
        self.emit("li a0, 1");
        self.emit_label(&end_label);
    }

    /// Best-effort recovery of the struct type an expression evaluates
    /// to, used only to look up field offsets for `Dot`. Returns `None`
    /// when the walk bottoms out at something that isn't struct-typed or
    /// isn't tracked (e.g. a call to an unknown function) — callers fall
    /// back to offset 0 in that case (spec.md §4.3.4).
    pub(super) fn derive_struct_type(&self, expr: &Expr, layout: &FunctionLayout) -> Option<String> {
        match expr {
            Expr::Identifier { name, .. } => layout.struct_types.get(name).cloned(),
            Expr::New { struct_name, .. } => Some(struct_name.clone()),
            Expr::Invocation { name, .. } => self.function_return_structs.get(name).cloned(),
            Expr::Dot { left, field, .. } => {
                let base = self.derive_struct_type(left, layout)?;
                self.struct_layout.field_struct_type(&base, field).map(str::to_string)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_program;

    #[test]
    fn and_short_circuits_before_evaluating_the_right_operand() {
        let src = "fun main() int { bool b; b = (1 < 0) && (2 < 3); return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        let beqz_idx = text.find("beqz a0, and_false_0").unwrap();
        let false_label_idx = text.find("and_false_0:").unwrap();
        let right_operand_idx = text.find("li a0, 2").unwrap();
        assert!(beqz_idx < right_operand_idx && right_operand_idx < false_label_idx);
    }

    #[test]
    fn relational_operators_compose_with_a_spilled_temp() {
        let program = parse_program("fun main() int { bool b; b = 2 < 3; return 0; }").unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.contains("mv t0, a0"));
        assert!(text.contains("slt a0, t0, a0"));
    }
}
