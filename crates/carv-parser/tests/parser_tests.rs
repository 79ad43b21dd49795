//! Parser tests for Carv.
//!
//! Covers: statements, declarations (functions, classes, interfaces, impls,
//! requires), expressions (precedence, postfix, borrow/deref/await, pipe,
//! interpolation, lambdas), type annotations, error recovery, and
//! determinism.

use carv_lexer::Lexer;
use carv_parser::{parse_source, ParseResult, Parser};
use carv_types::ast::*;
use carv_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse source and return the result (program + errors).
fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.carv", source);
    let lex = Lexer::new(&sf).lex();
    Parser::new(lex.tokens, &sf).parse()
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program
}

/// Parse source and return the error count.
fn error_count(source: &str) -> usize {
    parse(source).errors.total_errors
}

/// Parse a single expression statement and return its expression.
fn parse_expr(source: &str) -> Expr {
    let prog = parse_ok(&format!("{source};"));
    match prog.stmts.into_iter().next() {
        Some(Stmt::Expr(ExprStmt { expr, .. })) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

/// Parse `let x: <ty> = nil;` and return the annotation kind.
fn parse_type(ty: &str) -> TypeKind {
    let prog = parse_ok(&format!("let x: {ty} = nil;"));
    match &prog.stmts[0] {
        Stmt::Let(l) => l.type_ann.clone().expect("annotation").kind,
        other => panic!("expected let, got {other:?}"),
    }
}

fn binary_op(expr: &Expr) -> BinOp {
    match &expr.kind {
        ExprKind::Binary { op, .. } => *op,
        other => panic!("expected binary, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_let_and_const() {
    let prog = parse_ok("let x: int = 1; const NAME = \"carv\";");
    assert_eq!(prog.stmts.len(), 2);
    match &prog.stmts[0] {
        Stmt::Let(l) => {
            assert_eq!(l.kind, BindingKind::Let);
            assert_eq!(l.name.name, "x");
            assert_eq!(l.type_ann.as_ref().map(|t| &t.kind), Some(&TypeKind::Int));
        }
        other => panic!("expected let, got {other:?}"),
    }
    match &prog.stmts[1] {
        Stmt::Let(l) => assert_eq!(l.kind, BindingKind::Const),
        other => panic!("expected const, got {other:?}"),
    }
}

#[test]
fn test_semicolon_optional_before_closing_brace() {
    let prog = parse_ok("fn f() { return 1 }");
    assert_eq!(prog.stmts.len(), 1);
}

#[test]
fn test_missing_semicolon_is_error() {
    assert_eq!(error_count("let a = 1 let b = 2;"), 1);
}

#[test]
fn test_function_declaration() {
    let prog = parse_ok("async fn fetch(url: string, retries) -> string { return url; }");
    match &prog.stmts[0] {
        Stmt::Fn(f) => {
            assert!(f.is_async);
            assert_eq!(f.name.name, "fetch");
            assert_eq!(f.params.len(), 2);
            assert!(f.params[0].type_ann.is_some());
            assert!(f.params[1].type_ann.is_none());
            assert_eq!(f.ret.as_ref().map(|t| &t.kind), Some(&TypeKind::String));
            assert_eq!(f.body.stmts.len(), 1);
        }
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn test_return_without_value() {
    let prog = parse_ok("fn f() { return; }");
    match &prog.stmts[0] {
        Stmt::Fn(f) => assert!(matches!(
            &f.body.stmts[0],
            Stmt::Return(ReturnStmt { value: None, .. })
        )),
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn test_if_else_if_else() {
    let prog = parse_ok("if a { x; } else if b { y; } else { z; }");
    match &prog.stmts[0] {
        Stmt::If(i) => match &i.else_branch {
            Some(ElseBranch::ElseIf(inner)) => {
                assert!(matches!(inner.else_branch, Some(ElseBranch::Block(_))));
            }
            other => panic!("expected else-if, got {other:?}"),
        },
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_c_style_for() {
    let prog = parse_ok("for (let i = 0; i < 10; i += 1) { print(i); }");
    match &prog.stmts[0] {
        Stmt::For(f) => {
            assert!(matches!(f.init.as_deref(), Some(Stmt::Let(_))));
            assert!(f.condition.is_some());
            assert!(matches!(
                f.post.as_ref().map(|p| &p.kind),
                Some(ExprKind::Assign { op: AssignOp::Add, .. })
            ));
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn test_c_style_for_empty_header() {
    let prog = parse_ok("for (;;) { break; }");
    match &prog.stmts[0] {
        Stmt::For(f) => {
            assert!(f.init.is_none());
            assert!(f.condition.is_none());
            assert!(f.post.is_none());
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn test_for_in_while_loop() {
    let prog = parse_ok("for x in xs { } while true { continue; } loop { break; }");
    assert!(matches!(prog.stmts[0], Stmt::ForIn(_)));
    assert!(matches!(prog.stmts[1], Stmt::While(_)));
    assert!(matches!(prog.stmts[2], Stmt::Loop(_)));
}

#[test]
fn test_bare_block_statement() {
    let prog = parse_ok("{ let a = 1; }");
    assert!(matches!(prog.stmts[0], Stmt::Block(_)));
}

// ─────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_class_with_fields_and_methods() {
    let prog = parse_ok(
        r#"class Counter {
    count: int = 0,
    label: string
    fn get(&self) -> int { return self.count; }
    fn bump(&mut self, by: int) { self.count += by; }
    fn consume(self) { }
    fn make() -> int { return 1; }
}"#,
    );
    match &prog.stmts[0] {
        Stmt::Class(c) => {
            assert_eq!(c.name.name, "Counter");
            assert_eq!(c.fields.len(), 2);
            assert!(c.fields[0].default.is_some());
            assert!(c.fields[1].default.is_none());
            let receivers: Vec<Receiver> = c.methods.iter().map(|m| m.receiver).collect();
            assert_eq!(
                receivers,
                vec![Receiver::Ref, Receiver::RefMut, Receiver::Value, Receiver::None]
            );
            assert_eq!(c.methods[1].params.len(), 1);
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn test_interface_declaration() {
    let prog = parse_ok(
        r#"interface Shape {
    fn area(&self) -> float;
    fn scale(&mut self, k: float);
}"#,
    );
    match &prog.stmts[0] {
        Stmt::Interface(i) => {
            assert_eq!(i.methods.len(), 2);
            assert_eq!(i.methods[0].receiver, Receiver::Ref);
            assert_eq!(i.methods[1].receiver, Receiver::RefMut);
            assert!(i.methods[1].ret.is_none());
        }
        other => panic!("expected interface, got {other:?}"),
    }
}

#[test]
fn test_impl_declaration() {
    let prog = parse_ok("impl Shape for Circle { fn area(&self) -> float { return 1.0; } }");
    match &prog.stmts[0] {
        Stmt::Impl(i) => {
            assert_eq!(i.interface.name, "Shape");
            assert_eq!(i.target.name, "Circle");
            assert_eq!(i.methods.len(), 1);
        }
        other => panic!("expected impl, got {other:?}"),
    }
}

#[test]
fn test_require_forms() {
    let prog = parse_ok(
        r#"require "net";
require "web" as w;
require { get, serve } from "web";
require * from "./util";"#,
    );
    let imports: Vec<&ImportKind> = prog
        .stmts
        .iter()
        .map(|s| match s {
            Stmt::Require(r) => &r.import,
            other => panic!("expected require, got {other:?}"),
        })
        .collect();
    assert!(matches!(imports[0], ImportKind::Module { alias: None }));
    assert!(matches!(imports[1], ImportKind::Module { alias: Some(a) } if a.name == "w"));
    assert!(matches!(imports[2], ImportKind::Named(names) if names.len() == 2));
    assert!(matches!(imports[3], ImportKind::Wildcard));
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_mul_binds_tighter_than_add() {
    let expr = parse_expr("1 + 2 * 3");
    assert_eq!(binary_op(&expr), BinOp::Add);
    match &expr.kind {
        ExprKind::Binary { right, .. } => assert_eq!(binary_op(right), BinOp::Mul),
        _ => unreachable!(),
    }
}

#[test]
fn test_logical_precedence() {
    let expr = parse_expr("a || b && c == d");
    assert_eq!(binary_op(&expr), BinOp::Or);
    match &expr.kind {
        ExprKind::Binary { right, .. } => {
            assert_eq!(binary_op(right), BinOp::And);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_bitwise_precedence() {
    // `|` < `^` < `&` < equality
    let expr = parse_expr("a | b ^ c & d");
    assert_eq!(binary_op(&expr), BinOp::BitOr);
    let expr = parse_expr("1 << 2 + 3");
    assert_eq!(binary_op(&expr), BinOp::Shl);
}

#[test]
fn test_subtraction_is_left_associative() {
    let expr = parse_expr("a - b - c");
    match &expr.kind {
        ExprKind::Binary { left, op, .. } => {
            assert_eq!(*op, BinOp::Sub);
            assert_eq!(binary_op(left), BinOp::Sub);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = parse_expr("a = b = 1");
    match &expr.kind {
        ExprKind::Assign { target, value, .. } => {
            assert_eq!(target.as_identifier(), Some("a"));
            assert!(matches!(value.kind, ExprKind::Assign { .. }));
        }
        other => panic!("expected assign, got {other:?}"),
    }
}

#[test]
fn test_pipe_binds_looser_than_or() {
    let expr = parse_expr("xs |> len");
    assert!(matches!(expr.kind, ExprKind::Pipe { .. }));
    let expr = parse_expr("a || b |> f(1)");
    match &expr.kind {
        ExprKind::Pipe { left, right } => {
            assert_eq!(binary_op(left), BinOp::Or);
            assert!(matches!(right.kind, ExprKind::Call { .. }));
        }
        other => panic!("expected pipe, got {other:?}"),
    }
}

#[test]
fn test_borrow_deref_await() {
    assert!(matches!(
        parse_expr("&x").kind,
        ExprKind::Borrow { mutable: false, .. }
    ));
    assert!(matches!(
        parse_expr("&mut x").kind,
        ExprKind::Borrow { mutable: true, .. }
    ));
    assert!(matches!(parse_expr("*r").kind, ExprKind::Deref(_)));
    assert!(matches!(parse_expr("await fetch()").kind, ExprKind::Await(_)));
}

#[test]
fn test_await_applies_to_whole_postfix_chain() {
    match parse_expr("await client.get(url)").kind {
        ExprKind::Await(inner) => assert!(matches!(inner.kind, ExprKind::Call { .. })),
        other => panic!("expected await, got {other:?}"),
    }
}

#[test]
fn test_postfix_chain() {
    let expr = parse_expr("a.b(1)[2].c");
    match &expr.kind {
        ExprKind::Member { object, member } => {
            assert_eq!(member.name, "c");
            assert!(matches!(object.kind, ExprKind::Index { .. }));
        }
        other => panic!("expected member, got {other:?}"),
    }
}

#[test]
fn test_self_is_identifier() {
    assert_eq!(parse_expr("self").as_identifier(), Some("self"));
}

#[test]
fn test_literals() {
    assert!(matches!(parse_expr("42").kind, ExprKind::IntLit(42)));
    assert!(matches!(parse_expr("'c'").kind, ExprKind::CharLit('c')));
    assert!(matches!(parse_expr("nil").kind, ExprKind::NilLit));
    assert!(matches!(parse_expr("[1, 2, 3]").kind, ExprKind::ArrayLit(ref v) if v.len() == 3));
}

#[test]
fn test_map_literal_in_expression_position() {
    // At statement start `{` opens a block, so bind the map.
    let prog = parse_ok(r#"let m = {"a": 1, "b": 2};"#);
    match &prog.stmts[0] {
        Stmt::Let(l) => assert!(matches!(&l.value.kind, ExprKind::MapLit(v) if v.len() == 2)),
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_string_interpolation() {
    match parse_expr(r#""hi ${name}, you are ${age + 1}""#).kind {
        ExprKind::StringInterpolation(parts) => {
            assert_eq!(parts.len(), 4);
            assert!(matches!(&parts[0], StringPart::Literal(s) if s == "hi "));
            assert!(matches!(&parts[3], StringPart::Expr(_)));
        }
        other => panic!("expected interpolation, got {other:?}"),
    }
}

#[test]
fn test_new_expression() {
    match parse_expr("new Point { x: 1, y: 2 }").kind {
        ExprKind::New { class, fields } => {
            assert_eq!(class.name, "Point");
            assert_eq!(fields.len(), 2);
        }
        other => panic!("expected new, got {other:?}"),
    }
}

#[test]
fn test_lambdas() {
    match parse_expr("fn(a: int) -> int { return a; }").kind {
        ExprKind::Lambda(l) => {
            assert!(!l.is_async);
            assert_eq!(l.params.len(), 1);
        }
        other => panic!("expected lambda, got {other:?}"),
    }
    match parse_expr("async fn() { }").kind {
        ExprKind::Lambda(l) => assert!(l.is_async),
        other => panic!("expected lambda, got {other:?}"),
    }
}

#[test]
fn test_spans_are_one_based() {
    let prog = parse_ok("let a = 1;\n  print(a);");
    assert_eq!(prog.stmts[1].span().start_line, 2);
    assert_eq!(prog.stmts[1].span().start_col, 3);
}

// ─────────────────────────────────────────────────────────────────────
// Type annotations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_basic_type_annotations() {
    assert_eq!(parse_type("float"), TypeKind::Float);
    assert_eq!(parse_type("any"), TypeKind::Any);
    assert_eq!(parse_type("Point"), TypeKind::Named("Point".to_string()));
}

#[test]
fn test_compound_type_annotations() {
    assert!(matches!(parse_type("[int]"), TypeKind::Array(_)));
    assert!(matches!(parse_type("{string: int}"), TypeKind::Map(_, _)));
    assert!(matches!(parse_type("chan<int>"), TypeKind::Channel(_)));
    assert!(matches!(parse_type("int?"), TypeKind::Optional(_)));
    assert!(matches!(
        parse_type("&mut Point"),
        TypeKind::Reference { mutable: true, .. }
    ));
    match parse_type("fn(int, string) -> bool") {
        TypeKind::Function { params, ret } => {
            assert_eq!(params.len(), 2);
            assert_eq!(ret.kind, TypeKind::Bool);
        }
        other => panic!("expected fn type, got {other:?}"),
    }
}

#[test]
fn test_nested_generic_closing_shift() {
    match parse_type("Future<chan<int>>") {
        TypeKind::Future(inner) => assert!(matches!(inner.kind, TypeKind::Channel(_))),
        other => panic!("expected future, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery & limits
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_recovers_after_bad_statement() {
    let result = parse("let = 1; let ok = 2;");
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.program.stmts.len(), 1);
}

#[test]
fn test_multiple_errors_reported() {
    assert!(error_count("let = 1; let = 2; let = 3;") >= 3);
}

#[test]
fn test_stray_closing_brace() {
    let result = parse("} let a = 1;");
    assert!(result.errors.has_errors());
    assert_eq!(result.program.stmts.len(), 1);
}

#[test]
fn test_nesting_limit() {
    let src = format!("{}1{};", "(".repeat(100), ")".repeat(100));
    let result = parse(&src);
    assert!(result
        .errors
        .errors
        .iter()
        .any(|e| e.code == carv_types::ErrorCode::NESTING_LIMIT));
}

#[test]
fn test_long_operator_chain_hits_nesting_limit() {
    let src = format!("let x = {};", vec!["1"; 1000].join(" + "));
    let result = parse(&src);
    let limits = result
        .errors
        .errors
        .iter()
        .filter(|e| e.code == carv_types::ErrorCode::NESTING_LIMIT)
        .count();
    assert_eq!(limits, 1);
}

#[test]
fn test_long_pipe_and_call_chains_hit_nesting_limit() {
    let pipes = format!("let x = 1{};", " |> f".repeat(1000));
    assert!(parse(&pipes)
        .errors
        .errors
        .iter()
        .any(|e| e.code == carv_types::ErrorCode::NESTING_LIMIT));

    let calls = format!("let x = f{};", "()".repeat(1000));
    assert!(parse(&calls)
        .errors
        .errors
        .iter()
        .any(|e| e.code == carv_types::ErrorCode::NESTING_LIMIT));
}

#[test]
fn test_short_operator_chain_is_left_associative() {
    let expr = parse_expr(&vec!["1"; 20].join(" - "));
    let mut spine = 0;
    let mut node = &expr;
    while let ExprKind::Binary { left, op, .. } = &node.kind {
        assert_eq!(*op, BinOp::Sub);
        spine += 1;
        node = left;
    }
    assert_eq!(spine, 19);
    assert_eq!(error_count("let x = a.b.c[0](1)(2) |> f |> g;"), 0);
}

#[test]
fn test_parse_source_merges_lexer_errors() {
    let sf = SourceFile::new("test.carv", "let a = @ 1;");
    let result = parse_source(&sf);
    assert!(result.errors.has_errors());
}

#[test]
fn test_determinism_100_iterations() {
    let src = r#"
class Box { value: int }
fn main() {
    let b = new Box { value: 1 };
    let r = &b;
    print("${r.value}");
}
"#;
    let first = format!("{:?}", parse_ok(src));
    for _ in 0..100 {
        assert_eq!(format!("{:?}", parse_ok(src)), first);
    }
}
