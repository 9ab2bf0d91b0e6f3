//! Abstract Syntax Tree for Mini
//!
//! The tree shape matches the language grammar directly: struct type
//! declarations, global variable declarations, and functions over `int`,
//! `bool`, and heap-allocated struct references. Every node that can be
//! blamed for an error carries the source `line` it came from.

/// A type as written in source: a primitive, a named struct, or (internally)
/// the synthetic null sentinel used by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Struct(String),
}

impl Type {
    /// The analyzer's sentinel type for the `null` literal. Not a type a
    /// programmer can write; it only ever appears as an expression type
    /// during checking, never in a declaration.
    pub const NULL_STRUCT: &'static str = "__null__";

    pub fn null() -> Self {
        Type::Struct(Self::NULL_STRUCT.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Struct(name) if name == Self::NULL_STRUCT)
    }

    pub fn as_struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) if name != Self::NULL_STRUCT => Some(name.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Struct(name) if name == Self::NULL_STRUCT => write!(f, "null"),
            Type::Struct(name) => write!(f, "{name}"),
        }
    }
}

/// A function's return type: either nothing, or a concrete `Type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Real(Type),
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnType::Void => write!(f, "void"),
            ReturnType::Real(t) => write!(f, "{t}"),
        }
    }
}

use crate::ops::{BinaryOp, UnaryOp};

/// An expression node. Every variant carries the source line of its leading
/// token, except where noted.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer { value: String, line: i64 },
    True { line: i64 },
    False { line: i64 },
    Null { line: i64 },
    Identifier { name: String, line: i64 },
    Dot { left: Box<Expr>, field: String, line: i64 },
    New { struct_name: String, line: i64 },
    Invocation { name: String, args: Vec<Expr>, line: i64 },
    Unary { op: UnaryOp, operand: Box<Expr>, line: i64 },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, line: i64 },
    /// Synthesized only when an assignment's right-hand side is `read`.
    Read { line: i64 },
}

impl Expr {
    pub fn line(&self) -> i64 {
        match self {
            Expr::Integer { line, .. }
            | Expr::True { line }
            | Expr::False { line }
            | Expr::Null { line }
            | Expr::Identifier { line, .. }
            | Expr::Dot { line, .. }
            | Expr::New { line, .. }
            | Expr::Invocation { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Read { line } => *line,
        }
    }
}

/// An assignment target. Note the recursion is on l-values, not expressions:
/// `a.b.c = x` is `LValue::Dot(LValue::Dot(LValue::Id(a), b), c)`.
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Id { name: String, line: i64 },
    Dot { inner: Box<LValue>, field: String, line: i64 },
}

impl LValue {
    pub fn line(&self) -> i64 {
        match self {
            LValue::Id { line, .. } | LValue::Dot { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment { target: LValue, source: Expr, line: i64 },
    Block { stmts: Vec<Stmt>, line: i64 },
    Conditional { guard: Expr, then_branch: Box<Stmt>, else_branch: Box<Stmt>, line: i64 },
    While { guard: Expr, body: Box<Stmt>, line: i64 },
    Delete { expr: Expr, line: i64 },
    InvocationStmt { expr: Expr, line: i64 },
    Print { expr: Expr, line: i64 },
    PrintLn { expr: Expr, line: i64 },
    Return { expr: Expr, line: i64 },
    ReturnEmpty { line: i64 },
}

impl Stmt {
    /// A missing `else` is represented as an empty block at the synthetic
    /// line -1, per spec.
    pub fn empty_else() -> Stmt {
        Stmt::Block { stmts: Vec::new(), line: -1 }
    }

    pub fn line(&self) -> i64 {
        match self {
            Stmt::Assignment { line, .. }
            | Stmt::Block { line, .. }
            | Stmt::Conditional { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Delete { line, .. }
            | Stmt::InvocationStmt { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::PrintLn { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::ReturnEmpty { line } => *line,
        }
    }
}

/// A `type name;` declaration, used for globals, struct fields, and params.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub decl_type: Type,
    pub name: String,
    pub line: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub fields: Vec<Declaration>,
    pub line: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: ReturnType,
    pub params: Vec<Declaration>,
    pub locals: Vec<Declaration>,
    pub body: Vec<Stmt>,
    pub line: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub types: Vec<TypeDeclaration>,
    pub declarations: Vec<Declaration>,
    pub functions: Vec<Function>,
}
