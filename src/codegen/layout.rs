//! Struct and stack-frame layout (spec.md §4.3.2).
//!
//! Codegen does not reuse the analyzer's `StructRegistry`/`SymbolTable` —
//! it rebuilds the much smaller view it actually needs straight from the
//! AST, so the two passes stay fully decoupled.

use std::collections::HashMap;

use crate::ast::{Declaration, Function, Program, Type};
use crate::codegen::state::{FunctionLayout, StructLayout};

/// Field offsets are `4 * declaration index`; struct size is `4 * field
/// count`. Declared-twice structs (already flagged by the analyzer) keep
/// whichever declaration is seen first.
pub(super) fn build_struct_layout(program: &Program) -> StructLayout {
    let mut layout = StructLayout::default();
    for ty in &program.types {
        if layout.sizes.contains_key(&ty.name) {
            continue;
        }
        let mut offsets = HashMap::new();
        let mut struct_fields = HashMap::new();
        for (i, field) in ty.fields.iter().enumerate() {
            offsets.insert(field.name.clone(), 4 * i as i64);
            if let Type::Struct(name) = &field.decl_type {
                if name != Type::NULL_STRUCT {
                    struct_fields.insert(field.name.clone(), name.clone());
                }
            }
        }
        layout.sizes.insert(ty.name.clone(), 4 * ty.fields.len() as i64);
        layout.offsets.insert(ty.name.clone(), offsets);
        layout.field_struct_types.insert(ty.name.clone(), struct_fields);
    }
    layout
}

/// Functions whose return type is a (non-null) struct, mapped to that
/// struct's name. Codegen consults this when a caller needs to know the
/// size of the value a call produces.
pub(super) fn build_function_return_structs(program: &Program) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for func in &program.functions {
        if let crate::ast::ReturnType::Real(Type::Struct(name)) = &func.return_type {
            if !name.is_empty() {
                map.insert(func.name.clone(), name.clone());
            }
        }
    }
    map
}

/// Per-function slot assignment: params first, then locals, in
/// declaration order. The first slot sits at `-12(fp)`, each subsequent
/// slot four bytes further down, leaving room at `0(fp)`/`4(fp)` for the
/// saved `fp`/`ra` pair and `8(fp)`/above for `main`'s `input_file_ptr`
/// bookkeeping (spec.md §4.3.2).
pub(super) fn build_function_layout(func: &Function) -> FunctionLayout {
    let mut layout = FunctionLayout {
        param_count: func.params.len(),
        local_count: func.locals.len(),
        ..FunctionLayout::default()
    };

    let mut offset = -12;
    for decl in func.params.iter().chain(func.locals.iter()) {
        layout.offsets.insert(decl.name.clone(), offset);
        record_struct_type(&mut layout, decl);
        offset -= 4;
    }
    layout
}

fn record_struct_type(layout: &mut FunctionLayout, decl: &Declaration) {
    if let Type::Struct(name) = &decl.decl_type {
        if name != Type::NULL_STRUCT {
            layout.struct_types.insert(decl.name.clone(), name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn struct_field_offsets_increase_by_four() {
        let program = parse_program("struct P { int x; int y; bool z; } fun main() int { return 0; }").unwrap();
        let layout = build_struct_layout(&program);
        assert_eq!(layout.field_offset("P", "x"), Some(0));
        assert_eq!(layout.field_offset("P", "y"), Some(4));
        assert_eq!(layout.field_offset("P", "z"), Some(8));
        assert_eq!(layout.size_of("P"), Some(12));
    }

    #[test]
    fn function_slots_start_at_minus_twelve_params_then_locals() {
        let program = parse_program("fun f(int a, int b) int { int c; return 0; }").unwrap();
        let func = &program.functions[0];
        let layout = build_function_layout(func);
        assert_eq!(layout.offsets.get("a"), Some(&-12));
        assert_eq!(layout.offsets.get("b"), Some(&-16));
        assert_eq!(layout.offsets.get("c"), Some(&-20));
        assert_eq!(layout.frame_size(), 4 * 3 + 8);
    }
}
