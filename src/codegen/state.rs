//! CodeGen state and core types.
//!
//! Everything the code generator needs while walking one program: the
//! emitted line buffer, the label/temp counters, and the three side
//! tables spec.md §4.3 says codegen recomputes for itself rather than
//! reusing the analyzer's symbol table.

use std::collections::HashMap;

/// The rotating pool of caller-saved temporaries used to hold a spilled
/// left operand while the right operand of a binary expression is
/// evaluated. Reset to `t0` at the start of every statement (spec.md
/// §4.3.4).
pub(super) const TEMP_POOL: [&str; 7] = ["t0", "t1", "t2", "t3", "t4", "t5", "t6"];

/// Struct layout: field name -> byte offset, plus the struct's total size.
/// Both are recomputed from the AST rather than read from the analyzer's
/// struct registry (spec.md's codegen "rebuilds its own, simpler view").
#[derive(Debug, Clone, Default)]
pub struct StructLayout {
    pub offsets: HashMap<String, HashMap<String, i64>>,
    pub sizes: HashMap<String, i64>,
    /// struct -> field -> struct name, for fields that are themselves
    /// struct-typed. Feeds the best-effort type derivation walk `expr.rs`
    /// performs when generating a chained `Dot`.
    pub field_struct_types: HashMap<String, HashMap<String, String>>,
}

impl StructLayout {
    pub fn field_offset(&self, struct_name: &str, field: &str) -> Option<i64> {
        self.offsets.get(struct_name).and_then(|fields| fields.get(field)).copied()
    }

    pub fn size_of(&self, struct_name: &str) -> Option<i64> {
        self.sizes.get(struct_name).copied()
    }

    pub fn field_struct_type(&self, struct_name: &str, field: &str) -> Option<&str> {
        self.field_struct_types.get(struct_name).and_then(|fields| fields.get(field)).map(String::as_str)
    }
}

/// Per-function slot layout: every parameter and local gets a negative
/// offset from `fp`, in declaration order (params first), starting at -12
/// (spec.md §4.3.2).
#[derive(Debug, Clone, Default)]
pub struct FunctionLayout {
    pub offsets: HashMap<String, i64>,
    /// The struct name of each struct-typed local/param, for the
    /// best-effort type derivation `expr.rs` performs on `Dot` bases.
    pub struct_types: HashMap<String, String>,
    pub param_count: usize,
    pub local_count: usize,
}

impl FunctionLayout {
    /// Frame size: `4*(params+locals) + 8` bytes for the saved `ra`/`fp`.
    pub fn frame_size(&self) -> i64 {
        4 * (self.param_count + self.local_count) as i64 + 8
    }
}

/// Per-compilation state for the code generator. Constructed fresh for
/// each program; nothing here survives past the call that writes the
/// output file (spec.md §5).
pub struct CodeGen {
    lines: Vec<String>,
    label_counter: usize,
    temp_cursor: usize,
    pub(super) struct_layout: StructLayout,
    /// Function name -> struct name, for functions that return a struct
    /// (spec.md's `function_return_types` table). `None` covers both void
    /// and primitive-returning functions, neither of which need this.
    pub(super) function_return_structs: HashMap<String, String>,
    current_function_name: String,
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            lines: Vec::new(),
            label_counter: 0,
            temp_cursor: 0,
            struct_layout: StructLayout::default(),
            function_return_structs: HashMap::new(),
            current_function_name: String::new(),
        }
    }

    pub(super) fn set_current_function_name(&mut self, name: &str) {
        self.current_function_name = name.to_string();
    }

    pub(super) fn current_function_name(&self) -> &str {
        &self.current_function_name
    }

    /// Emit one instruction, four-space indented (spec.md §6).
    pub(super) fn emit(&mut self, instruction: impl Into<String>) {
        self.lines.push(format!("    {}", instruction.into()));
    }

    /// Emit a label, flush-left with a trailing colon.
    pub(super) fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{label}:"));
    }

    /// Emit a raw directive/line with no added indentation (used for
    /// `.globl`, `.import`, `.data`, `.text`, and data-section entries).
    pub(super) fn emit_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Generate a fresh, program-unique label with the given prefix.
    pub(super) fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    /// The next temporary in the rotating pool, advancing the cursor.
    pub(super) fn next_temp(&mut self) -> &'static str {
        let temp = TEMP_POOL[self.temp_cursor % TEMP_POOL.len()];
        self.temp_cursor += 1;
        temp
    }

    /// Reset the temp cursor; called at the start of every statement
    /// (spec.md §4.3.4).
    pub(super) fn reset_temp_cursor(&mut self) {
        self.temp_cursor = 0;
    }

    pub(super) fn take_lines(self) -> Vec<String> {
        self.lines
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_pool_rotates_mod_seven() {
        let mut cg = CodeGen::new();
        let first_round: Vec<_> = (0..7).map(|_| cg.next_temp()).collect();
        assert_eq!(first_round, TEMP_POOL.to_vec());
        assert_eq!(cg.next_temp(), "t0");
    }

    #[test]
    fn labels_are_unique_within_one_codegen() {
        let mut cg = CodeGen::new();
        let a = cg.fresh_label("else");
        let b = cg.fresh_label("else");
        assert_ne!(a, b);
    }
}
