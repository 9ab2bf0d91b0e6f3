//! L-value assignment and address computation (spec.md §4.3.5).

use crate::ast::LValue;
use crate::codegen::state::{CodeGen, FunctionLayout};

impl CodeGen {
    /// Store `a0` (already evaluated) into an identifier target. Dot
    /// targets go through `gen_lvalue_address` first (see
    /// `codegen::statements`), since their address must be computed
    /// *before* the source expression runs (spec.md §4.3.5).
    pub(super) fn gen_store_variable(&mut self, name: &str, layout: &FunctionLayout) {
        match layout.offsets.get(name) {
            Some(offset) => self.emit(format!("sw a0, {offset}(fp)")),
            None => {
                let temp = self.next_temp();
                self.emit(format!("mv {temp}, a0"));
                self.emit(format!("la a0, {name}"));
                self.emit(format!("sw {temp}, 0(a0)"));
            }
        }
    }

    /// Compute the address of `lvalue` into `a0`. For a bare identifier
    /// this is the slot's *value* (the struct pointer it holds), matching
    /// how `Dot` fields are always reached by dereferencing a pointer.
    pub(super) fn gen_lvalue_address(&mut self, lvalue: &LValue, layout: &FunctionLayout) {
        match lvalue {
            LValue::Id { name, .. } => self.gen_load_lvalue_id(name, layout),
            LValue::Dot { inner, field, .. } => {
                self.gen_lvalue_address(inner, layout);
                if matches!(inner.as_ref(), LValue::Dot { .. }) {
                    self.emit("lw a0, 0(a0)");
                }
                let struct_name = self.derive_lvalue_struct_type(inner, layout);
                let offset = struct_name
                    .as_deref()
                    .and_then(|s| self.struct_layout.field_offset(s, field))
                    .unwrap_or(0);
                self.emit(format!("addi a0, a0, {offset}"));
            }
        }
    }

    fn gen_load_lvalue_id(&mut self, name: &str, layout: &FunctionLayout) {
        match layout.offsets.get(name) {
            Some(offset) => self.emit(format!("lw a0, {offset}(fp)")),
            None => {
                self.emit(format!("la a0, {name}"));
                self.emit("lw a0, 0(a0)");
            }
        }
    }

    fn derive_lvalue_struct_type(&self, lvalue: &LValue, layout: &FunctionLayout) -> Option<String> {
        match lvalue {
            LValue::Id { name, .. } => layout.struct_types.get(name).cloned(),
            LValue::Dot { inner, field, .. } => {
                let base = self.derive_lvalue_struct_type(inner, layout)?;
                self.struct_layout.field_struct_type(&base, field).map(str::to_string)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_program;

    #[test]
    fn nested_dot_assignment_dereferences_the_inner_pointer() {
        let src = "struct N { struct N next; int v; } \
                   fun main() int { struct N a; a = new N; a.next.v = 3; return 0; }";
        let program = parse_program(src).unwrap();
        let text = crate::codegen::generate(&program);
        assert!(text.matches("lw a0, 0(a0)").count() >= 1);
    }
}
