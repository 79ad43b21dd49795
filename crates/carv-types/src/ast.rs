//! AST node types for the Carv language.
//!
//! Every node carries a [`Span`] for error reporting.
//! Recursive types are boxed to keep enum sizes reasonable.
//! Sequences keep source order; nothing here is sorted.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete Carv compilation unit: an ordered list of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name: T = expr;` / `const NAME = expr;`
    Let(LetStmt),
    /// `[async] fn name(params) -> R { body }`
    Fn(FnDecl),
    /// `return [expr];`
    Return(ReturnStmt),
    /// `break;`
    Break(Span),
    /// `continue;`
    Continue(Span),
    /// `if cond { ... } [else ...]`
    If(IfStmt),
    /// `for (init; cond; post) { ... }`
    For(ForStmt),
    /// `for item in iterable { ... }`
    ForIn(ForInStmt),
    /// `while cond { ... }`
    While(WhileStmt),
    /// `loop { ... }`
    Loop(LoopStmt),
    /// A bare `{ ... }` block.
    Block(Block),
    /// `class Name { fields... methods... }`
    Class(ClassDecl),
    /// `interface Name { method signatures... }`
    Interface(InterfaceDecl),
    /// `impl Interface for Class { methods... }`
    Impl(ImplDecl),
    /// `require ...;`
    Require(RequireStmt),
    /// An expression evaluated for its effect.
    Expr(ExprStmt),
}

impl Stmt {
    /// Source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Fn(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForIn(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Loop(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Class(s) => s.span,
            Stmt::Interface(s) => s.span,
            Stmt::Impl(s) => s.span,
            Stmt::Require(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

/// Whether a binding was introduced with `let` or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Const,
}

/// `let name: Type = expr;` or `const NAME: Type = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub kind: BindingKind,
    pub name: Ident,
    pub type_ann: Option<TypeAnnotation>,
    pub value: Expr,
    pub span: Span,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: Ident,
    pub is_async: bool,
    pub params: Vec<Param>,
    /// `None` means the function returns `void`.
    pub ret: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

/// A parameter: `name[: type]`. Unannotated parameters are `any`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub type_ann: Option<TypeAnnotation>,
    pub span: Span,
}

/// `return [expr];`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// `if cond { ... } [else { ... } | else if ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

/// The else branch of an `if`.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else if cond { ... }`
    ElseIf(Box<IfStmt>),
    /// `else { ... }`
    Block(Block),
}

/// `for (init; cond; post) { ... }` — every header part is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub post: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

/// `for item in iterable { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStmt {
    pub item: Ident,
    pub iterable: Expr,
    pub body: Block,
    pub span: Span,
}

/// `while cond { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// `loop { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStmt {
    pub body: Block,
    pub span: Span,
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A bare expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Classes, Interfaces, Impls
// ══════════════════════════════════════════════════════════════════════════════

/// How a method receives `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// No `self` parameter (static method).
    None,
    /// `self` — by value.
    Value,
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
}

impl Receiver {
    /// Source spelling, for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Receiver::None => "no receiver",
            Receiver::Value => "self",
            Receiver::Ref => "&self",
            Receiver::RefMut => "&mut self",
        }
    }
}

/// `class Name { field: T = default, fn method(&self) { ... } }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
}

/// A class field: `name: Type [= default]`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    pub default: Option<Expr>,
    pub span: Span,
}

/// A method with a body (in a class or an impl block).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub is_async: bool,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub ret: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

/// `interface Name { fn method(&self, a: T) -> R; }`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub methods: Vec<MethodSigDecl>,
    pub span: Span,
}

/// A bodiless method signature inside an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSigDecl {
    pub name: Ident,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub ret: Option<TypeAnnotation>,
    pub span: Span,
}

/// `impl Interface for Class { methods... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ImplDecl {
    pub interface: Ident,
    pub target: Ident,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Modules
// ══════════════════════════════════════════════════════════════════════════════

/// `require "path" [as alias];`, `require { a, b } from "path";`,
/// `require * from "path";`
#[derive(Debug, Clone, PartialEq)]
pub struct RequireStmt {
    pub path: String,
    pub import: ImportKind,
    pub span: Span,
}

/// What a `require` brings into scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    /// The module itself, under its own name or an alias.
    Module { alias: Option<Ident> },
    /// Selected members by name.
    Named(Vec<Ident>),
    /// Every member.
    Wildcard,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The identifier name if this expression is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    IntLit(i64),
    FloatLit(f64),
    /// `"hello"` (no interpolation)
    StringLit(String),
    /// `"hello ${name}"`
    StringInterpolation(Vec<StringPart>),
    CharLit(char),
    BoolLit(bool),
    NilLit,
    /// `[a, b, c]`
    ArrayLit(Vec<Expr>),
    /// `{ key: value, ... }`
    MapLit(Vec<(Expr, Expr)>),

    // ── Names & access ──
    /// `name` (also `self`)
    Identifier(String),
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `object.member`
    Member { object: Box<Expr>, member: Ident },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },

    // ── Operators ──
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `&x` / `&mut x`
    Borrow { mutable: bool, operand: Box<Expr> },
    /// `*x`
    Deref(Box<Expr>),
    /// `await expr`
    Await(Box<Expr>),
    /// `left |> right`
    Pipe { left: Box<Expr>, right: Box<Expr> },
    /// `target = value`, `target += value`, ...
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    // ── Construction ──
    /// `new Class { field: expr, ... }`
    New { class: Ident, fields: Vec<FieldInit> },
    /// `[async] fn(params) -> R { body }`
    Lambda(Box<LambdaExpr>),

    /// `(expr)`
    Paren(Box<Expr>),
}

/// A part of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Literal(String),
    Expr(Expr),
}

/// `field: value` inside `new Class { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

/// An anonymous function.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub is_async: bool,
    pub params: Vec<Param>,
    pub ret: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

// ── Operators ─────────────────────────────────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Bitwise
    BitOr,
    BitXor,
    BitAnd,
    // Equality
    Eq,
    NotEq,
    // Ordering
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // Shifts
    Shl,
    Shr,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// Prefix operators other than borrow, deref and await.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, `None` for plain `=`.
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
            AssignOp::BitAnd => Some(BinOp::BitAnd),
            AssignOp::BitOr => Some(BinOp::BitOr),
            AssignOp::BitXor => Some(BinOp::BitXor),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Type Annotations
// ══════════════════════════════════════════════════════════════════════════════

/// A type annotation as written in source.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    pub span: Span,
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a type annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Int,
    Float,
    Bool,
    String,
    Char,
    Void,
    Any,
    Nil,
    /// `[T]`
    Array(Box<TypeAnnotation>),
    /// `{K: V}`
    Map(Box<TypeAnnotation>, Box<TypeAnnotation>),
    /// `fn(T1, T2) -> R`
    Function {
        params: Vec<TypeAnnotation>,
        ret: Box<TypeAnnotation>,
    },
    /// `chan<T>`
    Channel(Box<TypeAnnotation>),
    /// `Future<T>`
    Future(Box<TypeAnnotation>),
    /// `T?`
    Optional(Box<TypeAnnotation>),
    /// `&T` / `&mut T`
    Reference {
        mutable: bool,
        inner: Box<TypeAnnotation>,
    },
    /// A class or interface name.
    Named(String),
}
