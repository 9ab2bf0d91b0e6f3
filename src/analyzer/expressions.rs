//! Expression typing rules (spec.md §4.2.2).
//!
//! Each visit returns the expression's type, or `None` if it could not be
//! determined — callers keep walking regardless, since a missing type at
//! one node must never suppress the checks a containing node would
//! otherwise perform (spec.md §7).

use crate::analyzer::Analyzer;
use crate::ast::{Expr, Type};
use crate::ops::BinaryOp;
use crate::symbols::SymbolEntry;

impl Analyzer {
    pub(super) fn analyze_expr(&mut self, expr: &Expr) -> Option<Type> {
        match expr {
            Expr::Integer { value, line } => self.check_integer_literal(value, *line),
            Expr::True { .. } | Expr::False { .. } => Some(Type::Bool),
            Expr::Null { .. } => Some(Type::null()),
            Expr::Read { .. } => Some(Type::Int),
            Expr::Identifier { name, line } => self.variable_type(name, *line),
            Expr::New { struct_name, line } => {
                if self.structs.contains(struct_name) {
                    Some(Type::Struct(struct_name.clone()))
                } else {
                    self.error(*line, format!("Unknown struct type '{struct_name}'"));
                    None
                }
            }
            Expr::Dot { left, field, line } => {
                let left_ty = self.analyze_expr(left)?;
                if left_ty.as_struct_name().is_none() {
                    self.error(*line, format!("Cannot access field '{field}' on non-struct type {left_ty}"));
                    return None;
                }
                self.field_type(&left_ty, field, *line)
            }
            Expr::Unary { op, operand, line } => self.analyze_unary(*op, operand, *line),
            Expr::Binary { op, left, right, line } => self.analyze_binary(*op, left, right, *line),
            Expr::Invocation { name, args, line } => self.analyze_invocation(name, args, *line),
        }
    }

    /// spec.md's open question on integer literal width, resolved: reject
    /// literals outside the signed 32-bit range. The literal is still
    /// `int`-typed afterward so a containing expression's own checks keep
    /// running (spec.md §7).
    fn check_integer_literal(&mut self, value: &str, line: i64) -> Option<Type> {
        let in_range = match value.parse::<i128>() {
            Ok(n) => (i32::MIN as i128..=i32::MAX as i128).contains(&n),
            Err(_) => false,
        };
        if !in_range {
            self.error(line, "Integer literal out of range");
        }
        Some(Type::Int)
    }

    fn analyze_unary(&mut self, op: crate::ops::UnaryOp, operand: &Expr, line: i64) -> Option<Type> {
        let operand_ty = self.analyze_expr(operand);
        match op {
            crate::ops::UnaryOp::Minus => match operand_ty {
                Some(Type::Int) => Some(Type::Int),
                Some(ty) => {
                    self.error(line, format!("Unary '-' requires an int operand, found {ty}"));
                    None
                }
                None => None,
            },
            crate::ops::UnaryOp::Not => match operand_ty {
                Some(Type::Bool) => Some(Type::Bool),
                Some(ty) => {
                    self.error(line, format!("Unary '!' requires a bool operand, found {ty}"));
                    None
                }
                None => None,
            },
        }
    }

    fn analyze_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, line: i64) -> Option<Type> {
        let left_ty = self.analyze_expr(left);
        let right_ty = self.analyze_expr(right);

        if op.is_arithmetic() {
            return match (left_ty, right_ty) {
                (Some(Type::Int), Some(Type::Int)) => Some(Type::Int),
                (Some(l), Some(r)) => {
                    self.error(line, format!("Operator '{}' requires int operands, found {l} and {r}", op.spelling()));
                    None
                }
                _ => None,
            };
        }

        if op.is_relational() {
            return match (left_ty, right_ty) {
                (Some(Type::Int), Some(Type::Int)) => Some(Type::Bool),
                (Some(l), Some(r)) => {
                    self.error(line, format!("Operator '{}' requires int operands, found {l} and {r}", op.spelling()));
                    None
                }
                _ => None,
            };
        }

        if op.is_equality() {
            return match (left_ty, right_ty) {
                (Some(Type::Int), Some(Type::Int)) => Some(Type::Bool),
                (Some(l), Some(r)) if l.as_struct_name().is_some() || l.is_null() => {
                    if r.as_struct_name().is_some() || r.is_null() {
                        Some(Type::Bool)
                    } else {
                        self.error(line, format!("Cannot compare {l} and {r} with '{}'", op.spelling()));
                        None
                    }
                }
                (Some(l), Some(r)) => {
                    self.error(line, format!("Cannot compare {l} and {r} with '{}'", op.spelling()));
                    let _ = (l, r);
                    None
                }
                _ => None,
            };
        }

        // logical
        match (left_ty, right_ty) {
            (Some(Type::Bool), Some(Type::Bool)) => Some(Type::Bool),
            (Some(l), Some(r)) => {
                self.error(line, format!("Operator '{}' requires bool operands, found {l} and {r}", op.spelling()));
                None
            }
            _ => None,
        }
    }

    fn analyze_invocation(&mut self, name: &str, args: &[Expr], line: i64) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|a| self.analyze_expr(a)).collect();

        let (return_type, params) = match self.symbols.lookup(name) {
            Some(SymbolEntry::Function { return_type, params, .. }) => {
                (return_type.clone(), params.clone())
            }
            Some(SymbolEntry::Variable { .. }) => {
                self.error(line, format!("'{name}' is a variable, not a function"));
                return None;
            }
            None => {
                self.error(line, format!("Undefined function '{name}'"));
                return None;
            }
        };

        if params.len() != args.len() {
            self.error(
                line,
                format!("Function '{name}' expects {} argument(s), got {}", params.len(), args.len()),
            );
        } else {
            for (i, (param_ty, arg_ty)) in params.iter().zip(arg_types.iter()).enumerate() {
                let Some(arg_ty) = arg_ty else { continue };
                let null_to_struct = arg_ty.is_null() && param_ty.as_struct_name().is_some();
                if arg_ty != param_ty && !null_to_struct {
                    self.error(
                        line,
                        format!("Argument {} to '{name}': expected {param_ty}, found {arg_ty}", i + 1),
                    );
                }
            }
        }

        match return_type {
            crate::ast::ReturnType::Void => None,
            crate::ast::ReturnType::Real(ty) => Some(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analyzer::analyze;
    use crate::parser::parse_program;

    fn error_messages(src: &str) -> Vec<String> {
        let program = parse_program(src).unwrap();
        analyze(&program).errors.into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn mixing_int_and_struct_equality_is_an_error() {
        let errs = error_messages(
            "struct P { int x; } fun main() int { struct P p; p = new P; if (p == 1) { } return 0; }",
        );
        assert!(errs.iter().any(|m| m.contains("Cannot compare")));
    }

    #[test]
    fn null_equals_struct_is_allowed() {
        let errs = error_messages(
            "struct P { int x; } fun main() int { struct P p; p = new P; if (p == null) { } return 0; }",
        );
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn call_with_wrong_arg_count_is_reported() {
        let errs = error_messages("fun f(int a) int { return a; } fun main() int { println f(); return 0; }");
        assert!(errs.iter().any(|m| m.contains("expects 1 argument")));
    }

    #[test]
    fn integer_literal_outside_i32_range_is_rejected() {
        let errs = error_messages("fun main() int { println 99999999999; return 0; }");
        assert!(errs.iter().any(|m| m.contains("Integer literal out of range")));
    }

    #[test]
    fn integer_literal_at_i32_max_is_accepted() {
        let errs = error_messages("fun main() int { println 2147483647; return 0; }");
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn null_argument_is_assignable_to_struct_param() {
        let errs = error_messages(
            "struct P { int x; } fun f(struct P p) int { return 0; } fun main() int { println f(null); return 0; }",
        );
        assert!(errs.is_empty(), "{errs:?}");
    }
}
