//! Carv semantic checker: walks a parsed AST, infers a type for every
//! expression and validates types, moves, borrows and async legality.
//!
//! Entry point: [`Checker::check`].
//!
//! Errors emitted:
//! - E200: unknown type
//! - E201: type mismatch
//! - E202: wrong argument count
//! - E203: undefined name
//! - E204: unknown field or method
//! - E205: unknown member of a builtin module
//! - E206: invalid assignment target
//! - E207: `break`/`continue` outside a loop
//! - E5xx: interface conformance (see `conformance.rs`)
//! - E600-E602: await legality (see `async_check.rs`)
//!
//! Warnings emitted:
//! - E300: use of moved value
//! - E400-E405: borrow conflicts, assignment while borrowed, escaping
//!   references, mutation through shared references
//!
//! The walk never stops early. Every rule that finds a problem records a
//! [`CheckIssue`] and returns a best-effort type so siblings and
//! descendants are still checked.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use carv_types::ast::*;
use carv_types::{ErrorCode, Span};

use crate::borrow::BorrowTracker;
use crate::builtins::{self, BuiltinRegistry};
use crate::env::{ScopeKind, TypeEnv};
use crate::issue::{CheckIssue, CheckOptions, CheckReport, IssueKind};
use crate::ownership::{OwnershipTracker, VarOwnership};
use crate::ty::{ClassType, FnType, InterfaceType, Type};
use crate::undo::Checkpoint;

// ══════════════════════════════════════════════════════════════════════════════
// Checker
// ══════════════════════════════════════════════════════════════════════════════

/// Checks one compilation unit. Construct one per program; `check`
/// consumes the checker.
pub struct Checker {
    pub(crate) options: CheckOptions,
    pub(crate) env: TypeEnv,
    pub(crate) ownership: OwnershipTracker,
    pub(crate) borrows: BorrowTracker,
    pub(crate) builtins: BuiltinRegistry,
    /// Classes by name, with their full method sets.
    pub(crate) classes: HashMap<String, Rc<ClassType>>,
    pub(crate) interfaces: HashMap<String, Rc<InterfaceType>>,
    /// `(class, interface)` pairs declared by `impl` blocks.
    pub(crate) impls: HashSet<(String, String)>,
    /// Signatures resolved ahead of the walk, keyed by declaration span.
    pub(crate) signatures: HashMap<Span, FnType>,
    /// Declared return type of each enclosing function body, if annotated.
    return_types: Vec<Option<Type>>,
    /// Per open block, the ownership record each name had before the block
    /// first rebound it.
    shadowed: Vec<Vec<(String, Option<VarOwnership>)>>,
    /// Variadic builtin names redeclared at top level.
    replaced_builtins: HashSet<String>,
    /// Set once a wildcard import of a non-builtin module is seen: its
    /// members are unknown, so unresolved names are no longer errors.
    opaque_wildcard: bool,
    report: CheckReport,
}

/// Rollback points for one nested construct.
#[must_use = "a frame must be closed with `exit_frame`"]
pub(crate) struct Frame {
    ownership: Checkpoint,
    borrows: Checkpoint,
}

/// A function, method or lambda body to check.
pub(crate) struct FnBody<'a> {
    pub params: &'a [Param],
    pub sig: &'a FnType,
    pub is_async: bool,
    /// Whether `return` operands are checked against the signature.
    pub has_ret_annotation: bool,
    /// The type bound to `self`, for methods with a receiver.
    pub self_ty: Option<Type>,
    pub body: &'a Block,
}

impl Checker {
    /// Create a checker with default options.
    pub fn new() -> Self {
        Self::with_options(CheckOptions::default())
    }

    /// Create a checker with the global scope seeded from the builtin table.
    pub fn with_options(options: CheckOptions) -> Self {
        let builtins = BuiltinRegistry::new();
        let mut env = TypeEnv::new();
        for (name, sig) in builtins.globals() {
            env.define(name, Type::Function(sig.clone()));
        }
        Self {
            options,
            env,
            ownership: OwnershipTracker::new(),
            borrows: BorrowTracker::new(),
            builtins,
            classes: HashMap::new(),
            interfaces: HashMap::new(),
            impls: HashSet::new(),
            signatures: HashMap::new(),
            return_types: Vec::new(),
            shadowed: Vec::new(),
            replaced_builtins: HashSet::new(),
            opaque_wildcard: false,
            report: CheckReport::default(),
        }
    }

    /// Check a complete program and return every diagnostic found.
    #[tracing::instrument(skip_all, fields(stmts = program.stmts.len()))]
    pub fn check(mut self, program: &Program) -> CheckReport {
        tracing::debug!(file = %self.options.file_name, "checking program");
        self.declare_types(&program.stmts);
        self.hoist_functions(&program.stmts);
        for stmt in &program.stmts {
            self.check_stmt(stmt);
        }
        tracing::debug!(
            errors = self.report.errors.len(),
            warnings = self.report.warnings.len(),
            "check finished"
        );
        self.report
    }

    /// Bind top-level function signatures before the walk so functions may
    /// call each other regardless of order.
    fn hoist_functions(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Fn(decl) = stmt {
                let sig = self.signature(&decl.params, decl.ret.as_ref(), decl.is_async);
                self.signatures.insert(decl.span, sig.clone());
                self.note_global_binding(&decl.name.name);
                self.env.define(&decl.name.name, Type::Function(sig));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Frames
    // ══════════════════════════════════════════════════════════════════════

    /// Push scope, ownership and borrow state together. Used by function,
    /// method and lambda bodies and by loops.
    pub(crate) fn enter_frame(&mut self, kind: ScopeKind) -> Frame {
        self.env.push_scope(kind);
        tracing::trace!(?kind, depth = self.env.depth(), "enter frame");
        Frame {
            ownership: self.ownership.push(),
            borrows: self.borrows.push(),
        }
    }

    /// Discard everything recorded since the matching `enter_frame`.
    pub(crate) fn exit_frame(&mut self, frame: Frame) {
        self.borrows.pop(frame.borrows);
        self.ownership.pop(frame.ownership);
        self.env.pop_scope();
        tracing::trace!(depth = self.env.depth(), "exit frame");
    }

    /// Bind a fresh name: define it and reset its ownership record.
    pub(crate) fn bind(&mut self, name: &str, ty: Type) {
        if self.env.current_scope_kind() == ScopeKind::Block {
            if let Some(saved) = self.shadowed.last_mut() {
                if !saved.iter().any(|(n, _)| n == name) {
                    saved.push((name.to_string(), self.ownership.state(name).cloned()));
                }
            }
        }
        if self.env.at_global() {
            self.note_global_binding(name);
        }
        self.ownership.track(name, &ty);
        self.env.define(name, ty);
    }

    fn note_global_binding(&mut self, name: &str) {
        if builtins::is_variadic(name) {
            self.replaced_builtins.insert(name.to_string());
        }
    }

    /// `name` is a variadic builtin that no user binding hides.
    fn is_builtin_variadic(&self, name: &str) -> bool {
        builtins::is_variadic(name)
            && !self.replaced_builtins.contains(name)
            && self.env.resolves_globally(name)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn check_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt, Stmt::Class(_) | Stmt::Interface(_) | Stmt::Impl(_))
            && !self.env.at_global()
        {
            self.declare_types(std::slice::from_ref(stmt));
        }

        match stmt {
            Stmt::Let(s) => self.check_let(s),
            Stmt::Fn(decl) => self.check_fn_decl(decl),
            Stmt::Return(s) => self.check_return(s),
            Stmt::Break(span) => self.check_loop_control("break", *span),
            Stmt::Continue(span) => self.check_loop_control("continue", *span),
            Stmt::If(s) => self.check_if(s),
            Stmt::For(s) => self.check_for(s),
            Stmt::ForIn(s) => self.check_for_in(s),
            Stmt::While(s) => {
                let frame = self.enter_frame(ScopeKind::Loop);
                self.check_condition(&s.condition, "while");
                self.check_block(&s.body);
                self.exit_frame(frame);
            }
            Stmt::Loop(s) => {
                let frame = self.enter_frame(ScopeKind::Loop);
                self.check_block(&s.body);
                self.exit_frame(frame);
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::Class(decl) => self.check_class(decl),
            // Interfaces carry no bodies; registration is all there is.
            Stmt::Interface(_) => {}
            Stmt::Impl(decl) => self.check_impl(decl),
            Stmt::Require(s) => self.check_require(s),
            Stmt::Expr(s) => {
                self.check_expr(&s.expr);
            }
        }
    }

    /// `if` branches and bare blocks scope names and borrows, but moves made
    /// inside them stay visible afterwards. Only the records of names the
    /// block rebinds are put back on exit.
    pub(crate) fn check_block(&mut self, block: &Block) {
        self.env.push_scope(ScopeKind::Block);
        let borrows = self.borrows.push();
        self.shadowed.push(Vec::new());
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        for (name, record) in self.shadowed.pop().unwrap_or_default() {
            self.ownership.restore(&name, record);
        }
        self.borrows.pop(borrows);
        self.env.pop_scope();
    }

    fn check_let(&mut self, stmt: &LetStmt) {
        let inferred = self.check_expr(&stmt.value);
        let ty = match &stmt.type_ann {
            Some(ann) => {
                let declared = self.resolve_type_annotation(ann);
                if !self.assignable(&inferred, &declared) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("cannot assign {inferred} to {declared}"),
                        stmt.value.span,
                    );
                }
                declared
            }
            None => inferred.clone(),
        };

        // Move the source before binding so `let s = s;` leaves the new
        // binding Owned.
        if let Some(source) = stmt.value.as_identifier() {
            if inferred.is_move() {
                self.ownership
                    .mark_moved(source, stmt.span.start_line, &stmt.name.name);
            }
        }
        self.bind(&stmt.name.name, ty);
    }

    fn check_fn_decl(&mut self, decl: &FnDecl) {
        let sig = self.declared_signature(decl.span, &decl.params, decl.ret.as_ref(), decl.is_async);
        // Bound in the enclosing scope so the body can recurse.
        self.bind(&decl.name.name, Type::Function(sig.clone()));
        self.check_function_body(FnBody {
            params: &decl.params,
            sig: &sig,
            is_async: decl.is_async,
            has_ret_annotation: decl.ret.is_some(),
            self_ty: None,
            body: &decl.body,
        });
    }

    pub(crate) fn check_function_body(&mut self, body: FnBody<'_>) {
        let frame = self.enter_frame(ScopeKind::Function {
            is_async: body.is_async,
        });
        if let Some(self_ty) = body.self_ty {
            self.bind("self", self_ty);
        }
        for (param, ty) in body.params.iter().zip(&body.sig.params) {
            self.bind(&param.name.name, ty.clone());
        }

        let expected = body.has_ret_annotation.then(|| {
            let ret = body.sig.ret.as_ref();
            if body.is_async {
                ret.future_output().unwrap_or(ret).clone()
            } else {
                ret.clone()
            }
        });
        self.return_types.push(expected);
        for stmt in &body.body.stmts {
            self.check_stmt(stmt);
        }
        self.return_types.pop();
        self.exit_frame(frame);
    }

    fn check_return(&mut self, stmt: &ReturnStmt) {
        let ty = match &stmt.value {
            Some(value) => self.check_expr(value),
            None => Type::Void,
        };

        if let Some(name) = stmt.value.as_ref().and_then(Expr::as_identifier) {
            if ty.is_move() {
                self.ownership
                    .mark_moved(name, stmt.span.start_line, "return");
            }
        }

        if matches!(ty, Type::Reference { .. }) {
            self.warn(
                ErrorCode::REFERENCE_ESCAPES,
                "reference cannot escape function scope".to_string(),
                stmt.span,
            );
        }

        if let Some(Some(expected)) = self.return_types.last().cloned() {
            if !self.assignable(&ty, &expected) {
                self.error(
                    ErrorCode::TYPE_MISMATCH,
                    format!("cannot return {ty} from a function returning {expected}"),
                    stmt.span,
                );
            }
        }
    }

    fn check_loop_control(&mut self, keyword: &str, span: Span) {
        if !self.env.in_loop() {
            self.error(
                ErrorCode::CONTROL_OUTSIDE_LOOP,
                format!("'{keyword}' outside of a loop"),
                span,
            );
        }
    }

    fn check_condition(&mut self, condition: &Expr, construct: &str) {
        let ty = self.check_expr(condition);
        if ty != Type::Bool && !ty.is_dynamic() {
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!("{construct} condition must be bool, got {ty}"),
                condition.span,
            );
        }
    }

    fn check_if(&mut self, stmt: &IfStmt) {
        self.check_condition(&stmt.condition, "if");
        self.check_block(&stmt.then_block);
        match &stmt.else_branch {
            Some(ElseBranch::ElseIf(nested)) => self.check_if(nested),
            Some(ElseBranch::Block(block)) => self.check_block(block),
            None => {}
        }
    }

    fn check_for(&mut self, stmt: &ForStmt) {
        let frame = self.enter_frame(ScopeKind::Loop);
        if let Some(init) = &stmt.init {
            self.check_stmt(init);
        }
        if let Some(condition) = &stmt.condition {
            self.check_condition(condition, "for");
        }
        self.check_block(&stmt.body);
        if let Some(post) = &stmt.post {
            self.check_expr(post);
        }
        self.exit_frame(frame);
    }

    fn check_for_in(&mut self, stmt: &ForInStmt) {
        let frame = self.enter_frame(ScopeKind::Loop);
        let iterable = self.check_expr(&stmt.iterable);
        let item = match iterable.auto_deref().0 {
            Type::Array(elem) => elem.as_ref().clone(),
            _ => Type::Any,
        };
        self.bind(&stmt.item.name, item);
        self.check_block(&stmt.body);
        self.exit_frame(frame);
    }

    fn check_require(&mut self, stmt: &RequireStmt) {
        let builtin = self.builtins.has_module(&stmt.path);
        match &stmt.import {
            ImportKind::Module { alias } => {
                let name = alias
                    .as_ref()
                    .map_or_else(|| module_binding_name(&stmt.path), |a| a.name.clone());
                self.bind(&name, Type::Module(stmt.path.clone()));
            }
            ImportKind::Named(names) => {
                for ident in names {
                    let ty = if builtin {
                        self.module_member(&stmt.path, ident)
                    } else {
                        Type::Any
                    };
                    self.bind(&ident.name, ty);
                }
            }
            ImportKind::Wildcard if builtin => {
                let members: Vec<(String, FnType)> = self
                    .builtins
                    .members(&stmt.path)
                    .map(|(name, sig)| (name.to_string(), sig.clone()))
                    .collect();
                for (name, sig) in members {
                    self.bind(&name, Type::Function(sig));
                }
            }
            ImportKind::Wildcard => {
                self.opaque_wildcard = true;
                self.bind(
                    &module_binding_name(&stmt.path),
                    Type::Module(stmt.path.clone()),
                );
            }
        }
        tracing::debug!(path = %stmt.path, builtin, "module required");
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Infer the type of `expr`, recording it when requested.
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.infer_expr(expr);
        if self.options.record_expr_types {
            self.report.expr_types.insert(expr.span, ty.clone());
        }
        ty
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::IntLit(_) => Type::Int,
            ExprKind::FloatLit(_) => Type::Float,
            ExprKind::StringLit(_) => Type::String,
            ExprKind::StringInterpolation(parts) => {
                for part in parts {
                    if let StringPart::Expr(e) = part {
                        self.check_expr(e);
                    }
                }
                Type::String
            }
            ExprKind::CharLit(_) => Type::Char,
            ExprKind::BoolLit(_) => Type::Bool,
            ExprKind::NilLit => Type::Nil,
            ExprKind::ArrayLit(elems) => {
                let mut elem_ty = None;
                for elem in elems {
                    let ty = self.check_expr(elem);
                    elem_ty.get_or_insert(ty);
                }
                Type::Array(Box::new(elem_ty.unwrap_or(Type::Any)))
            }
            ExprKind::MapLit(entries) => {
                let mut entry_ty = None;
                for (key, value) in entries {
                    let k = self.check_expr(key);
                    let v = self.check_expr(value);
                    entry_ty.get_or_insert((k, v));
                }
                let (k, v) = entry_ty.unwrap_or((Type::Any, Type::Any));
                Type::Map(Box::new(k), Box::new(v))
            }

            ExprKind::Identifier(name) => {
                let ty = self.lookup(name, expr.span);
                self.warn_if_moved(name, expr.span);
                ty
            }
            ExprKind::Call { callee, args } => {
                let callee_ty = self.check_expr(callee);
                let args: Vec<&Expr> = args.iter().collect();
                self.check_call(callee, &callee_ty, &args, expr.span)
            }
            ExprKind::Member { object, member } => self.check_member(object, member),
            ExprKind::Index { object, index } => self.check_index(object, index, expr.span),

            ExprKind::Binary { left, op, right } => {
                let l = self.check_expr(left);
                let r = self.check_expr(right);
                self.binary_result(*op, &l, &r, expr.span)
            }
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            ExprKind::Borrow { mutable, operand } => self.check_borrow(*mutable, operand),
            ExprKind::Deref(operand) => {
                let ty = self.check_expr(operand);
                match ty {
                    Type::Reference { inner, .. } => *inner,
                    other if other.is_dynamic() => other,
                    other => {
                        self.warn(
                            ErrorCode::INVALID_DEREF,
                            format!("cannot dereference non-reference type {other}"),
                            expr.span,
                        );
                        other
                    }
                }
            }
            ExprKind::Await(operand) => self.check_await(operand, expr.span),
            ExprKind::Pipe { left, right } => self.check_pipe(left, right, expr.span),
            ExprKind::Assign { target, op, value } => {
                self.check_assign(target, *op, value, expr.span)
            }

            ExprKind::New { class, fields } => self.check_new(class, fields),
            ExprKind::Lambda(lambda) => {
                let sig = self.signature(&lambda.params, lambda.ret.as_ref(), lambda.is_async);
                self.check_function_body(FnBody {
                    params: &lambda.params,
                    sig: &sig,
                    is_async: lambda.is_async,
                    has_ret_annotation: lambda.ret.is_some(),
                    self_ty: None,
                    body: &lambda.body,
                });
                Type::Function(sig)
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
        }
    }

    fn lookup(&mut self, name: &str, span: Span) -> Type {
        if let Some(ty) = self.env.lookup(name) {
            return ty.clone();
        }
        if self.opaque_wildcard {
            return Type::Any;
        }
        self.error(
            ErrorCode::UNDEFINED_NAME,
            format!("undefined: '{name}'"),
            span,
        );
        Type::Unknown
    }

    fn warn_if_moved(&mut self, name: &str, span: Span) {
        let moved_line = self.ownership.moved_at(name).map(|site| site.line);
        if let Some(line) = moved_line {
            self.warn(
                ErrorCode::USE_AFTER_MOVE,
                format!("use of moved value '{name}' (moved at line {line})"),
                span,
            );
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    /// Check a call of `callee` (already typed as `callee_ty`) with `args`.
    fn check_call(&mut self, callee: &Expr, callee_ty: &Type, args: &[&Expr], span: Span) -> Type {
        let Type::Function(sig) = callee_ty else {
            // Lenient: calling a non-function yields Any.
            for arg in args {
                self.check_expr(arg);
            }
            return Type::Any;
        };

        let name = callee_name(callee);
        let variadic = callee
            .as_identifier()
            .is_some_and(|n| self.is_builtin_variadic(n));
        let describe = name.map_or_else(|| "function".to_string(), |n| format!("'{n}'"));

        if !variadic && args.len() != sig.params.len() {
            self.error(
                ErrorCode::WRONG_ARG_COUNT,
                format!(
                    "{describe} expects {} argument(s), got {}",
                    sig.params.len(),
                    args.len()
                ),
                span,
            );
        }

        let moves = name.is_some() && !variadic;
        for (i, arg) in args.iter().enumerate() {
            let arg_ty = self.check_expr(arg);
            if let Some(param) = sig.params.get(i) {
                if *param != Type::Any && !self.assignable(&arg_ty, param) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!(
                            "argument {} to {describe}: cannot assign {arg_ty} to {param}",
                            i + 1
                        ),
                        arg.span,
                    );
                }
            }
            if moves && arg_ty.is_move() {
                if let Some(var) = arg.as_identifier() {
                    self.ownership
                        .mark_moved(var, arg.span.start_line, "function call");
                }
            }
        }
        sig.ret.as_ref().clone()
    }

    /// `a |> f` is `f(a)`; `a |> f(b)` is `f(a, b)`.
    fn check_pipe(&mut self, left: &Expr, right: &Expr, span: Span) -> Type {
        match &right.kind {
            ExprKind::Call { callee, args } => {
                let callee_ty = self.check_expr(callee);
                let args: Vec<&Expr> = std::iter::once(left).chain(args.iter()).collect();
                self.check_call(callee, &callee_ty, &args, span)
            }
            _ => {
                let callee_ty = self.check_expr(right);
                self.check_call(right, &callee_ty, &[left], span)
            }
        }
    }

    // ── Member access & indexing ──────────────────────────────────────────

    fn check_member(&mut self, object: &Expr, member: &Ident) -> Type {
        let object_ty = self.check_expr(object);
        let (target, shared) = object_ty.auto_deref();
        let through_shared = shared == Some(true);
        match target {
            Type::Class(class) => self.class_member(&class.name, member, through_shared),
            Type::Interface(iface) => self.interface_member(&iface.name, member, through_shared),
            Type::Module(path) => {
                if self.builtins.has_module(path) {
                    self.module_member(path, member)
                } else {
                    Type::Any
                }
            }
            Type::Any | Type::Unknown => target.clone(),
            other => {
                self.error(
                    ErrorCode::UNKNOWN_MEMBER,
                    format!("type {other} has no member '{}'", member.name),
                    member.span,
                );
                Type::Unknown
            }
        }
    }

    fn class_member(&mut self, class_name: &str, member: &Ident, through_shared: bool) -> Type {
        let Some(class) = self.classes.get(class_name).cloned() else {
            return Type::Unknown;
        };
        if let Some(field) = class.fields.get(&member.name) {
            return field.clone();
        }
        if let Some(method) = class.methods.get(&member.name) {
            if through_shared && method.receiver == Receiver::RefMut {
                self.warn(
                    ErrorCode::MUTATION_THROUGH_SHARED_REF,
                    format!(
                        "cannot call '&mut self' method '{}' through a shared reference to '{class_name}'",
                        member.name
                    ),
                    member.span,
                );
            }
            return Type::Function(method.fn_type.clone());
        }
        self.error(
            ErrorCode::UNKNOWN_MEMBER,
            format!(
                "class '{class_name}' has no field or method '{}'",
                member.name
            ),
            member.span,
        );
        Type::Unknown
    }

    fn interface_member(&mut self, iface_name: &str, member: &Ident, through_shared: bool) -> Type {
        let Some(iface) = self.interfaces.get(iface_name).cloned() else {
            return Type::Unknown;
        };
        let Some(method) = iface.methods.get(&member.name) else {
            self.error(
                ErrorCode::UNKNOWN_MEMBER,
                format!("interface '{iface_name}' has no method '{}'", member.name),
                member.span,
            );
            return Type::Unknown;
        };
        if through_shared && method.receiver == Receiver::RefMut {
            self.error(
                ErrorCode::MUT_METHOD_THROUGH_SHARED_REF,
                format!(
                    "cannot call '&mut self' method '{}' through a shared '&{iface_name}' reference",
                    member.name
                ),
                member.span,
            );
        }
        Type::Function(method.fn_type.clone())
    }

    /// Type of `member` in builtin module `module`.
    pub(crate) fn module_member(&mut self, module: &str, member: &Ident) -> Type {
        match self.builtins.member(module, &member.name).cloned() {
            Some(sig) => Type::Function(sig),
            None => {
                self.error(
                    ErrorCode::UNKNOWN_MODULE_MEMBER,
                    format!("module '{module}' has no member '{}'", member.name),
                    member.span,
                );
                Type::Unknown
            }
        }
    }

    fn check_index(&mut self, object: &Expr, index: &Expr, span: Span) -> Type {
        let object_ty = self.check_expr(object);
        let index_ty = self.check_expr(index);
        let int_index = index_ty == Type::Int || index_ty.is_dynamic();
        match object_ty.auto_deref().0 {
            Type::Array(elem) => {
                if !int_index {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("array index must be int, got {index_ty}"),
                        index.span,
                    );
                }
                elem.as_ref().clone()
            }
            Type::Map(key, value) => {
                if !self.assignable(&index_ty, key) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("map key must be {key}, got {index_ty}"),
                        index.span,
                    );
                }
                value.as_ref().clone()
            }
            Type::String => {
                if !int_index {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("string index must be int, got {index_ty}"),
                        index.span,
                    );
                }
                Type::Char
            }
            Type::Any => Type::Any,
            Type::Unknown => Type::Unknown,
            other => {
                self.error(
                    ErrorCode::TYPE_MISMATCH,
                    format!("cannot index into {other}"),
                    span,
                );
                Type::Unknown
            }
        }
    }

    // ── Operators ─────────────────────────────────────────────────────────

    /// Result type of `left op right`, reporting operand errors at `span`.
    fn binary_result(&mut self, op: BinOp, left: &Type, right: &Type, span: Span) -> Type {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if op == BinOp::Add && *left == Type::String && *right == Type::String {
                    return Type::String;
                }
                if left.is_dynamic() || right.is_dynamic() {
                    return Type::Any;
                }
                if left.is_numeric() && right.is_numeric() {
                    return if *left == Type::Float || *right == Type::Float {
                        Type::Float
                    } else {
                        Type::Int
                    };
                }
                self.error(
                    ErrorCode::TYPE_MISMATCH,
                    format!(
                        "operator '{}' cannot be applied to {left} and {right}",
                        op.as_str()
                    ),
                    span,
                );
                left.clone()
            }
            BinOp::Eq | BinOp::NotEq => Type::Bool,
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                let comparable = |t: &Type| t.is_comparable() || t.is_dynamic();
                if !comparable(left) || !comparable(right) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("cannot compare {left} and {right} with '{}'", op.as_str()),
                        span,
                    );
                }
                Type::Bool
            }
            BinOp::And | BinOp::Or => {
                let boolean = |t: &Type| *t == Type::Bool || t.is_dynamic();
                if !boolean(left) || !boolean(right) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!(
                            "operator '{}' requires bool operands, got {left} and {right}",
                            op.as_str()
                        ),
                        span,
                    );
                }
                Type::Bool
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                let integer = |t: &Type| *t == Type::Int || t.is_dynamic();
                if !integer(left) || !integer(right) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!(
                            "operator '{}' requires int operands, got {left} and {right}",
                            op.as_str()
                        ),
                        span,
                    );
                }
                Type::Int
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Type {
        let ty = self.check_expr(operand);
        let (ok, result) = match op {
            UnaryOp::Neg => (ty.is_numeric(), ty.clone()),
            UnaryOp::Not => (ty == Type::Bool, Type::Bool),
            UnaryOp::BitNot => (ty == Type::Int, Type::Int),
        };
        if !ok && !ty.is_dynamic() {
            let wanted = match op {
                UnaryOp::Neg => "a numeric",
                UnaryOp::Not => "a bool",
                UnaryOp::BitNot => "an int",
            };
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!("unary '{}' requires {wanted} operand, got {ty}", op.as_str()),
                span,
            );
        }
        result
    }

    // ── Borrows ───────────────────────────────────────────────────────────

    fn check_borrow(&mut self, mutable: bool, operand: &Expr) -> Type {
        let Some(name) = operand.as_identifier() else {
            // Only borrows of plain bindings are tracked.
            let inner = self.check_expr(operand);
            return Type::Reference {
                inner: Box::new(inner),
                mutable,
            };
        };

        let inner = self.lookup(name, operand.span);
        if self.options.record_expr_types {
            self.report.expr_types.insert(operand.span, inner.clone());
        }
        if self.ownership.is_moved(name) {
            self.warn(
                ErrorCode::BORROW_OF_MOVED,
                format!("cannot borrow moved value '{name}'"),
                operand.span,
            );
        } else {
            for conflict in self.borrows.borrow(name, mutable) {
                self.warn(ErrorCode::BORROW_CONFLICT, conflict.to_string(), operand.span);
            }
        }
        Type::Reference {
            inner: Box::new(inner),
            mutable,
        }
    }

    // ── Assignment ────────────────────────────────────────────────────────

    fn check_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr, span: Span) -> Type {
        let value_ty = self.check_expr(value);
        match &target.kind {
            ExprKind::Identifier(name) => {
                let declared = self.lookup(name, target.span);
                if op != AssignOp::Assign {
                    self.warn_if_moved(name, target.span);
                }
                if self.borrows.is_borrowed(name) {
                    self.warn(
                        ErrorCode::ASSIGN_WHILE_BORROWED,
                        format!("cannot assign to '{name}' while it is borrowed"),
                        target.span,
                    );
                }
                self.check_assigned_value(&declared, op, &value_ty, span);
            }
            ExprKind::Member { object, member } => {
                let object_ty = self.check_expr(object);
                let (owner, shared) = object_ty.auto_deref();
                match owner {
                    Type::Class(class) => {
                        let field = self
                            .classes
                            .get(&class.name)
                            .and_then(|c| c.fields.get(&member.name))
                            .cloned();
                        match field {
                            Some(field_ty) => {
                                if shared == Some(true) {
                                    self.warn(
                                        ErrorCode::MUTATION_THROUGH_SHARED_REF,
                                        format!(
                                            "cannot assign to field '{}' through a shared reference",
                                            member.name
                                        ),
                                        target.span,
                                    );
                                }
                                self.check_assigned_value(&field_ty, op, &value_ty, span);
                            }
                            None => self.error(
                                ErrorCode::UNKNOWN_MEMBER,
                                format!("class '{}' has no field '{}'", class.name, member.name),
                                member.span,
                            ),
                        }
                    }
                    Type::Any | Type::Unknown => {}
                    other => self.error(
                        ErrorCode::UNKNOWN_MEMBER,
                        format!("type {other} has no field '{}'", member.name),
                        member.span,
                    ),
                }
            }
            ExprKind::Index { object, index } => {
                let elem_ty = self.check_index(object, index, target.span);
                self.check_assigned_value(&elem_ty, op, &value_ty, span);
            }
            _ => {
                self.check_expr(target);
                self.error(
                    ErrorCode::INVALID_ASSIGN_TARGET,
                    "invalid assignment target".to_string(),
                    target.span,
                );
            }
        }
        Type::Void
    }

    /// `target op= value` must produce something assignable to `target_ty`.
    fn check_assigned_value(&mut self, target_ty: &Type, op: AssignOp, value_ty: &Type, span: Span) {
        let result = match op.binary_op() {
            Some(bin) => self.binary_result(bin, target_ty, value_ty, span),
            None => value_ty.clone(),
        };
        if !self.assignable(&result, target_ty) {
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!("cannot assign {result} to {target_ty}"),
                span,
            );
        }
    }

    // ── Construction ──────────────────────────────────────────────────────

    fn check_new(&mut self, class: &Ident, fields: &[FieldInit]) -> Type {
        let Some(def) = self.classes.get(&class.name).cloned() else {
            self.error(
                ErrorCode::UNKNOWN_TYPE,
                format!("unknown class '{}'", class.name),
                class.span,
            );
            for init in fields {
                self.check_expr(&init.value);
            }
            return Type::Unknown;
        };

        for init in fields {
            let value_ty = self.check_expr(&init.value);
            match def.fields.get(&init.name.name) {
                Some(field_ty) => {
                    if !self.assignable(&value_ty, field_ty) {
                        self.error(
                            ErrorCode::TYPE_MISMATCH,
                            format!(
                                "field '{}': cannot assign {value_ty} to {field_ty}",
                                init.name.name
                            ),
                            init.value.span,
                        );
                    }
                }
                None => self.error(
                    ErrorCode::UNKNOWN_MEMBER,
                    format!("class '{}' has no field '{}'", def.name, init.name.name),
                    init.name.span,
                ),
            }
        }
        Type::Class(def)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Types
    // ══════════════════════════════════════════════════════════════════════

    /// Assignability with the `impl` table answering Class → Interface.
    pub(crate) fn assignable(&self, from: &Type, to: &Type) -> bool {
        from.assignable_with(to, &|class: &str, iface: &str| {
            self.impls
                .contains(&(class.to_string(), iface.to_string()))
        })
    }

    pub(crate) fn resolve_type_annotation(&mut self, ann: &TypeAnnotation) -> Type {
        match &ann.kind {
            TypeKind::Int => Type::Int,
            TypeKind::Float => Type::Float,
            TypeKind::Bool => Type::Bool,
            TypeKind::String => Type::String,
            TypeKind::Char => Type::Char,
            TypeKind::Void => Type::Void,
            TypeKind::Any => Type::Any,
            TypeKind::Nil => Type::Nil,
            TypeKind::Array(inner) => Type::Array(Box::new(self.resolve_type_annotation(inner))),
            TypeKind::Map(key, value) => Type::Map(
                Box::new(self.resolve_type_annotation(key)),
                Box::new(self.resolve_type_annotation(value)),
            ),
            TypeKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type_annotation(p))
                    .collect();
                Type::Function(FnType::new(params, self.resolve_type_annotation(ret)))
            }
            TypeKind::Channel(inner) => {
                Type::Channel(Box::new(self.resolve_type_annotation(inner)))
            }
            TypeKind::Future(inner) => Type::Future(Box::new(self.resolve_type_annotation(inner))),
            TypeKind::Optional(inner) => {
                Type::Optional(Box::new(self.resolve_type_annotation(inner)))
            }
            TypeKind::Reference { mutable, inner } => Type::Reference {
                inner: Box::new(self.resolve_type_annotation(inner)),
                mutable: *mutable,
            },
            TypeKind::Named(name) => {
                if let Some(class) = self.classes.get(name) {
                    return Type::Class(Rc::clone(class));
                }
                if let Some(iface) = self.interfaces.get(name) {
                    return Type::Interface(Rc::clone(iface));
                }
                self.error(
                    ErrorCode::UNKNOWN_TYPE,
                    format!("unknown type '{name}'"),
                    ann.span,
                );
                Type::Unknown
            }
        }
    }

    /// Build a function type. Unannotated params are `any`, an unannotated
    /// return is `void`, and async functions return `Future<R>`.
    pub(crate) fn signature(
        &mut self,
        params: &[Param],
        ret: Option<&TypeAnnotation>,
        is_async: bool,
    ) -> FnType {
        let params = params
            .iter()
            .map(|p| {
                p.type_ann
                    .as_ref()
                    .map_or(Type::Any, |ann| self.resolve_type_annotation(ann))
            })
            .collect();
        let ret = ret.map_or(Type::Void, |ann| self.resolve_type_annotation(ann));
        let ret = if is_async {
            Type::Future(Box::new(ret))
        } else {
            ret
        };
        FnType::new(params, ret)
    }

    /// The signature resolved for a declaration ahead of the walk, or a
    /// freshly resolved one.
    pub(crate) fn declared_signature(
        &mut self,
        span: Span,
        params: &[Param],
        ret: Option<&TypeAnnotation>,
        is_async: bool,
    ) -> FnType {
        match self.signatures.remove(&span) {
            Some(sig) => sig,
            None => self.signature(params, ret, is_async),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Diagnostics
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn error(&mut self, code: ErrorCode, message: String, span: Span) {
        tracing::trace!(%code, %message, line = span.start_line, "type error");
        self.report
            .errors
            .push(issue(IssueKind::TypeError, code, message, span));
    }

    pub(crate) fn warn(&mut self, code: ErrorCode, message: String, span: Span) {
        tracing::trace!(%code, %message, line = span.start_line, "warning");
        self.report
            .warnings
            .push(issue(IssueKind::Warning, code, message, span));
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn issue(kind: IssueKind, code: ErrorCode, message: String, span: Span) -> CheckIssue {
    CheckIssue {
        line: span.start_line,
        column: span.start_col,
        kind,
        code,
        message,
    }
}

/// Name used in diagnostics and for move tracking of a call's callee.
fn callee_name(callee: &Expr) -> Option<&str> {
    match &callee.kind {
        ExprKind::Identifier(name) => Some(name),
        ExprKind::Member { member, .. } => Some(&member.name),
        _ => None,
    }
}

/// `"./lib/math.carv"` binds as `math`.
fn module_binding_name(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.strip_suffix(".carv").unwrap_or(file).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_binding_name() {
        assert_eq!(module_binding_name("net"), "net");
        assert_eq!(module_binding_name("./lib/math.carv"), "math");
        assert_eq!(module_binding_name("utils.carv"), "utils");
    }

    #[test]
    fn test_builtins_seeded_in_global_scope() {
        let checker = Checker::new();
        assert!(matches!(checker.env.lookup("println"), Some(Type::Function(_))));
        assert!(checker.env.lookup("tcp_listen").is_none());
    }
}
