//! Semantic analyzer for Mini.
//!
//! A single driving pass: register struct names, populate struct fields,
//! process globals, pre-declare functions (so forward references resolve),
//! then analyze each function body under a fresh child scope. Every rule
//! violation is recorded rather than raised — the analyzer never aborts, so
//! a caller sees every defect in one run (spec.md §4.2, §7).

mod expressions;

use crate::ast::{Function, LValue, Program, ReturnType, Stmt, Type};
use crate::symbols::{StructRegistry, SymbolEntry, SymbolTable};

/// One semantic defect: a message and the source line it was found on.
/// Kept structured (rather than pre-formatted) so tests can assert on
/// `line` without parsing the rendered `ERROR. ... #<line>` text.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub message: String,
    pub line: i64,
}

impl SemanticError {
    fn new(line: i64, message: impl Into<String>) -> Self {
        SemanticError { message: message.into(), line }
    }
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ERROR. {} #{}", self.message, self.line)
    }
}

/// The result of one `analyze` run: every defect found, in the order the
/// analyzer encountered them.
pub struct AnalysisResult {
    pub errors: Vec<SemanticError>,
}

impl AnalysisResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Print each error in order, followed by the `ERRORS FOUND N` line
    /// spec.md §4.2 mandates, and return the count (so callers can decide
    /// whether to run codegen without a second pass over `errors`).
    pub fn print_report(&self) -> usize {
        for error in &self.errors {
            println!("{error}");
        }
        println!("ERRORS FOUND {}", self.errors.len());
        self.errors.len()
    }
}

struct Analyzer {
    structs: StructRegistry,
    symbols: SymbolTable,
    errors: Vec<SemanticError>,
    current_function: Option<(String, ReturnType)>,
    main_declared: bool,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            structs: StructRegistry::new(),
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            current_function: None,
            main_declared: false,
        }
    }

    fn error(&mut self, line: i64, message: impl Into<String>) {
        self.errors.push(SemanticError::new(line, message));
    }

    // ---- phase 1 & 2: struct registry ----

    fn register_struct_names(&mut self, program: &Program) {
        for ty in &program.types {
            if !self.structs.declare(&ty.name, ty.line) {
                self.error(ty.line, format!("Struct '{}' is already declared", ty.name));
            }
        }
    }

    fn populate_struct_fields(&mut self, program: &Program) {
        for ty in &program.types {
            // A struct declared twice has no entry to populate into; skip
            // rather than clobbering the first declaration's fields.
            let Some(info) = self.structs.get(&ty.name).cloned() else { continue };
            if info.line != ty.line {
                continue;
            }
            let mut info = info;
            for field in &ty.fields {
                if info.has_field(&field.name) {
                    self.error(
                        field.line,
                        format!("Duplicate field '{}' in struct '{}'", field.name, ty.name),
                    );
                    continue;
                }
                info.field_order.push(field.name.clone());
                info.fields.insert(field.name.clone(), field.clone());
            }
            if let Some(slot) = self.structs.get_mut(&ty.name) {
                *slot = info;
            }
        }
    }

    // ---- phase 3: globals ----

    fn process_globals(&mut self, program: &Program) {
        for decl in &program.declarations {
            let entry = SymbolEntry::Variable { ty: decl.decl_type.clone(), line: decl.line };
            if !self.symbols.insert(&decl.name, entry) {
                self.error(decl.line, format!("Global variable '{}' is already declared", decl.name));
            }
        }
    }

    // ---- phase 4: pre-declare functions ----

    fn predeclare_functions(&mut self, program: &Program) {
        for func in &program.functions {
            if func.name == "main" {
                self.main_declared = true;
                if !func.params.is_empty() {
                    self.error(func.line, "main() must take no parameters");
                }
                if !matches!(func.return_type, ReturnType::Real(Type::Int)) {
                    self.error(func.line, "main() must return int");
                }
            }

            let entry = SymbolEntry::Function {
                return_type: func.return_type.clone(),
                params: func.params.iter().map(|p| p.decl_type.clone()).collect(),
                line: func.line,
            };
            if !self.symbols.insert(&func.name, entry) {
                self.error(func.line, format!("Function '{}' is already declared", func.name));
            }
        }
    }

    // ---- phase 5: function bodies ----

    fn analyze_function(&mut self, func: &Function) {
        self.symbols.push_scope();
        self.current_function = Some((func.name.clone(), func.return_type.clone()));

        for param in &func.params {
            let entry = SymbolEntry::Variable { ty: param.decl_type.clone(), line: param.line };
            if !self.symbols.insert(&param.name, entry) {
                self.error(param.line, format!("Duplicate parameter '{}'", param.name));
            }
        }

        for local in &func.locals {
            if self.symbols.lookup_local(&local.name).is_some() {
                self.error(
                    local.line,
                    format!("Local variable '{}' conflicts with an existing declaration", local.name),
                );
                continue;
            }
            let entry = SymbolEntry::Variable { ty: local.decl_type.clone(), line: local.line };
            self.symbols.insert(&local.name, entry);
        }

        for stmt in &func.body {
            self.analyze_stmt(stmt);
        }

        self.current_function = None;
        self.symbols.pop_scope();
    }

    // ---- phase 6: main presence ----

    fn check_main_declared(&mut self) {
        if !self.main_declared {
            self.error(1, "Program must declare a function named 'main'");
        }
    }

    // ---- §4.2.3 statement rules ----

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assignment { target, source, line } => {
                let target_ty = self.lvalue_type(target);
                let source_ty = if matches!(source, crate::ast::Expr::Read { .. }) {
                    Some(Type::Int)
                } else {
                    self.analyze_expr(source)
                };
                if let (Some(target_ty), Some(source_ty)) = (&target_ty, &source_ty) {
                    let null_to_struct = source_ty.is_null() && target_ty.as_struct_name().is_some();
                    if target_ty != source_ty && !null_to_struct {
                        self.error(
                            *line,
                            format!("Type mismatch in assignment: cannot assign {source_ty} to {target_ty}"),
                        );
                    }
                }
            }
            Stmt::Block { stmts, .. } => {
                for s in stmts {
                    self.analyze_stmt(s);
                }
            }
            Stmt::Conditional { guard, then_branch, else_branch, .. } => {
                self.expect_bool_guard(guard);
                self.analyze_stmt(then_branch);
                self.analyze_stmt(else_branch);
            }
            Stmt::While { guard, body, .. } => {
                self.expect_bool_guard(guard);
                self.analyze_stmt(body);
            }
            Stmt::Delete { expr, line } => {
                if let Some(ty) = self.analyze_expr(expr) {
                    if ty.as_struct_name().is_none() {
                        self.error(*line, format!("'delete' requires a struct-typed operand, found {ty}"));
                    }
                }
            }
            Stmt::InvocationStmt { expr, .. } => {
                self.analyze_expr(expr);
            }
            Stmt::Print { expr, line } => self.expect_int_arg(expr, "print", *line),
            Stmt::PrintLn { expr, line } => self.expect_int_arg(expr, "println", *line),
            Stmt::Return { expr, line } => self.analyze_return(expr, *line),
            Stmt::ReturnEmpty { line } => self.analyze_return_empty(*line),
        }
    }

    fn expect_bool_guard(&mut self, guard: &crate::ast::Expr) {
        let line = guard.line();
        if let Some(ty) = self.analyze_expr(guard) {
            if ty != Type::Bool {
                self.error(line, format!("Guard expression must be of type bool, found {ty}"));
            }
        }
    }

    fn expect_int_arg(&mut self, expr: &crate::ast::Expr, keyword: &str, line: i64) {
        if let Some(ty) = self.analyze_expr(expr) {
            if ty != Type::Int {
                self.error(line, format!("'{keyword}' requires an int operand, found {ty}"));
            }
        }
    }

    fn analyze_return(&mut self, expr: &crate::ast::Expr, line: i64) {
        let Some((name, return_type)) = self.current_function.clone() else { return };
        match return_type {
            ReturnType::Void => {
                self.error(line, format!("void function '{name}' must not return a value"));
                self.analyze_expr(expr);
            }
            ReturnType::Real(expected) => {
                if let Some(actual) = self.analyze_expr(expr) {
                    let null_to_struct = actual.is_null() && expected.as_struct_name().is_some();
                    if actual != expected && !null_to_struct {
                        self.error(
                            line,
                            format!("Type mismatch in return: expected {expected}, found {actual}"),
                        );
                    }
                }
            }
        }
    }

    fn analyze_return_empty(&mut self, line: i64) {
        let Some((_, return_type)) = self.current_function.clone() else { return };
        if !matches!(return_type, ReturnType::Void) {
            self.error(line, "'return;' is only legal in a void function");
        }
    }

    // ---- l-value typing, shared with expression typing for Identifier/Dot ----

    fn lvalue_type(&mut self, lvalue: &LValue) -> Option<Type> {
        match lvalue {
            LValue::Id { name, line } => self.variable_type(name, *line),
            LValue::Dot { inner, field, line } => {
                let inner_ty = self.lvalue_type(inner)?;
                self.field_type(&inner_ty, field, *line)
            }
        }
    }

    fn variable_type(&mut self, name: &str, line: i64) -> Option<Type> {
        match self.symbols.lookup(name) {
            Some(SymbolEntry::Variable { ty, .. }) => Some(ty.clone()),
            Some(SymbolEntry::Function { .. }) => {
                self.error(line, format!("'{name}' is a function, not a variable"));
                None
            }
            None => {
                self.error(line, format!("Undefined variable '{name}'"));
                None
            }
        }
    }

    fn field_type(&mut self, base: &Type, field: &str, line: i64) -> Option<Type> {
        let struct_name = base.as_struct_name()?;
        let Some(info) = self.structs.get(struct_name) else {
            self.error(line, format!("Unknown struct type '{struct_name}'"));
            return None;
        };
        match info.field_type(field) {
            Some(ty) => Some(ty.clone()),
            None => {
                self.error(line, format!("Struct '{struct_name}' has no field '{field}'"));
                None
            }
        }
    }
}

/// Run the full analysis pipeline over `program` and return every defect
/// found, in source order within each phase (spec.md §5).
pub fn analyze(program: &Program) -> AnalysisResult {
    let mut analyzer = Analyzer::new();
    analyzer.register_struct_names(program);
    analyzer.populate_struct_fields(program);
    analyzer.process_globals(program);
    analyzer.predeclare_functions(program);
    for func in &program.functions {
        analyzer.analyze_function(func);
    }
    analyzer.check_main_declared();
    AnalysisResult { errors: analyzer.errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn errors_for(src: &str) -> Vec<SemanticError> {
        let program = parse_program(src).unwrap();
        analyze(&program).errors
    }

    #[test]
    fn well_formed_program_has_zero_errors() {
        let errs = errors_for("fun main() int { int x; x = 2 + 3; println x; return 0; }");
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn main_must_return_int() {
        let errs = errors_for("fun main() bool { return true; }");
        assert_eq!(errs, vec![SemanticError::new(1, "main() must return int")]);
    }

    #[test]
    fn assignment_type_mismatch_is_reported() {
        let errs = errors_for("fun main() int { int x; x = true; return 0; }");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("cannot assign bool to int"));
    }

    #[test]
    fn null_is_struct_assignable() {
        let errs = errors_for(
            "struct N { struct N next; } fun main() int { struct N a; a = new N; a.next = null; return 0; }",
        );
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn missing_main_is_pinned_to_line_one() {
        let errs = errors_for("fun helper() int { return 1; }");
        assert!(errs.iter().any(|e| e.line == 1 && e.message.contains("main")));
    }

    #[test]
    fn duplicate_struct_names_are_rejected() {
        let errs = errors_for("struct P { int x; } struct P { int y; } fun main() int { return 0; }");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("already declared"));
    }

    #[test]
    fn injected_defect_count_matches_reported_errors() {
        // Three independent defects: bad main signature, unknown variable,
        // and a bool printed where an int is required.
        let errs = errors_for(
            "fun main() int { println y; print true; return 0; } fun main(int z) int { return 0; }",
        );
        assert_eq!(errs.len(), 4, "{errs:?}");
    }

    #[test]
    fn analysis_does_not_leak_state_across_programs() {
        let first = errors_for("struct P { int x; } fun main() int { return 0; }");
        assert!(first.is_empty());
        let second = errors_for("fun main() int { struct P p; p = new P; return 0; }");
        assert!(!second.is_empty(), "struct P from the first program must not leak");
    }
}
