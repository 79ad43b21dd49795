//! Interface, impl and conformance tests.

use carv_compiler::{check_source, CheckReport};
use carv_types::ErrorCode;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn check(source: &str) -> CheckReport {
    match check_source(source, "test.carv") {
        Ok(report) => report,
        Err(err) => panic!("test source did not parse: {err:?}"),
    }
}

fn assert_ok(source: &str) {
    let report = check(source);
    assert!(report.is_ok(), "expected no errors, got {:?}", report.errors);
}

fn assert_error(source: &str, code: ErrorCode) {
    let report = check(source);
    assert!(
        report.errors.iter().any(|e| e.code == code),
        "expected error {code}, got {:?}",
        report.errors
    );
}

fn messages(report: &CheckReport, code: ErrorCode) -> Vec<String> {
    report
        .issues()
        .filter(|i| i.code == code)
        .map(|i| i.message.clone())
        .collect()
}

const SHAPE: &str = r#"
interface Shape {
    fn area(&self) -> float;
    fn grow(&mut self, k: float);
}
class Circle {
    r: float
}
"#;

const SHAPE_IMPL: &str = r#"
impl Shape for Circle {
    fn area(&self) -> float {
        return 3.14 * self.r * self.r;
    }
    fn grow(&mut self, k: float) {
        self.r *= k;
    }
}
"#;

// ══════════════════════════════════════════════════════════════════════════════
// Conforming impls
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn conforming_impl_passes() {
    let report = check(&format!("{SHAPE}{SHAPE_IMPL}"));
    assert!(report.is_ok(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn class_body_methods_count_toward_conformance() {
    assert_ok(
        r#"
interface Named {
    fn name(&self) -> string;
}
class User {
    login: string
    fn name(&self) -> string {
        return self.login;
    }
}
impl Named for User {
}
"#,
    );
}

#[test]
fn impl_before_declarations() {
    assert_ok(
        r#"
impl Greeter for Bot {
    fn greet(&self) -> string {
        return "beep";
    }
}
class Bot {
    id: int
}
interface Greeter {
    fn greet(&self) -> string;
}
"#,
    );
}

#[test]
fn impl_methods_callable_on_class() {
    assert_ok(&format!(
        r#"{SHAPE}{SHAPE_IMPL}
let c = new Circle {{ r: 1.0 }};
let a: float = c.area();
c.grow(2.0);
"#
    ));
}

#[test]
fn param_widening_is_accepted() {
    assert_ok(
        r#"
interface Scaler {
    fn scale(&self, k: int) -> float;
}
class Unit {
    v: float
}
impl Scaler for Unit {
    fn scale(&self, k: float) -> int {
        return 1;
    }
}
"#,
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Conformance errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn missing_method() {
    let report = check(&format!(
        r#"{SHAPE}
impl Shape for Circle {{
    fn area(&self) -> float {{
        return 1.0;
    }}
}}
"#
    ));
    assert_eq!(
        messages(&report, ErrorCode::MISSING_METHOD),
        vec!["missing method 'grow' in impl of 'Shape' for 'Circle'"]
    );
}

#[test]
fn wrong_parameter_count() {
    assert_error(
        &format!(
            r#"{SHAPE}
impl Shape for Circle {{
    fn area(&self, precision: int) -> float {{
        return 1.0;
    }}
    fn grow(&mut self, k: float) {{
    }}
}}
"#
        ),
        ErrorCode::METHOD_ARITY,
    );
}

#[test]
fn wrong_parameter_type() {
    let report = check(&format!(
        r#"{SHAPE}
impl Shape for Circle {{
    fn area(&self) -> float {{
        return 1.0;
    }}
    fn grow(&mut self, k: string) {{
    }}
}}
"#
    ));
    assert_eq!(
        messages(&report, ErrorCode::PARAM_TYPE_MISMATCH),
        vec!["parameter 1 of method 'grow' has type string, but interface 'Shape' declares float"]
    );
}

#[test]
fn wrong_return_type() {
    let report = check(&format!(
        r#"{SHAPE}
impl Shape for Circle {{
    fn area(&self) -> string {{
        return "big";
    }}
    fn grow(&mut self, k: float) {{
    }}
}}
"#
    ));
    assert_eq!(
        messages(&report, ErrorCode::RETURN_TYPE_MISMATCH),
        vec!["return type mismatch for method 'area': interface 'Shape' declares float, found string"]
    );
}

#[test]
fn receiver_mismatch_only_warns() {
    let report = check(&format!(
        r#"{SHAPE}
impl Shape for Circle {{
    fn area(&mut self) -> float {{
        return 1.0;
    }}
    fn grow(&mut self, k: float) {{
    }}
}}
"#
    ));
    assert!(report.is_ok(), "{:?}", report.errors);
    assert_eq!(
        messages(&report, ErrorCode::RECEIVER_MISMATCH),
        vec!["receiver mismatch for method 'area': interface 'Shape' declares '&self', found '&mut self'"]
    );
}

#[test]
fn unknown_interface_or_class_in_impl() {
    assert_error(
        r#"
class Circle {
    r: float
}
impl Drawable for Circle {
}
"#,
        ErrorCode::UNKNOWN_IMPL_TARGET,
    );
    assert_error(
        r#"
interface Drawable {
    fn draw(&self);
}
impl Drawable for Ghost {
    fn draw(&self) {
    }
}
"#,
        ErrorCode::UNKNOWN_IMPL_TARGET,
    );
}

#[test]
fn unknown_type_in_impl_signature_reported_once() {
    let report = check(&format!(
        r#"{SHAPE}
impl Shape for Circle {{
    fn area(&self) -> float {{
        return 1.0;
    }}
    fn grow(&mut self, k: Widget) {{
    }}
}}
"#
    ));
    assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    assert_eq!(report.errors[0].code, ErrorCode::UNKNOWN_TYPE);
}

// ══════════════════════════════════════════════════════════════════════════════
// Interface values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn class_assignable_to_implemented_interface() {
    assert_ok(&format!(
        r#"{SHAPE}{SHAPE_IMPL}
let c = new Circle {{ r: 2.0 }};
let s: Shape = c;
let a: float = s.area();
"#
    ));
}

#[test]
fn class_not_assignable_without_impl() {
    assert_error(
        &format!(
            r#"{SHAPE}
let c = new Circle {{ r: 2.0 }};
let s: Shape = c;
"#
        ),
        ErrorCode::TYPE_MISMATCH,
    );
}

#[test]
fn references_to_interfaces() {
    assert_ok(&format!(
        r#"{SHAPE}{SHAPE_IMPL}
fn total(s: &Shape) -> float {{
    return s.area();
}}
fn enlarge(s: &mut Shape) {{
    s.grow(2.0);
}}
let c = new Circle {{ r: 2.0 }};
let t = total(&c);
enlarge(&mut c);
"#
    ));
}

#[test]
fn mut_method_through_shared_interface_reference() {
    let report = check(&format!(
        r#"{SHAPE}{SHAPE_IMPL}
fn enlarge(s: &Shape) {{
    s.grow(2.0);
}}
"#
    ));
    assert_eq!(
        messages(&report, ErrorCode::MUT_METHOD_THROUGH_SHARED_REF),
        vec!["cannot call '&mut self' method 'grow' through a shared '&Shape' reference"]
    );
    assert!(!report.is_ok());
}

#[test]
fn unknown_interface_method() {
    assert_error(
        &format!(
            r#"{SHAPE}
fn perimeter(s: &Shape) -> float {{
    return s.perimeter();
}}
"#
        ),
        ErrorCode::UNKNOWN_MEMBER,
    );
}

#[test]
fn interface_method_arguments_checked() {
    assert_error(
        &format!(
            r#"{SHAPE}
fn enlarge(s: &mut Shape) {{
    s.grow("twice");
}}
"#
        ),
        ErrorCode::TYPE_MISMATCH,
    );
}

#[test]
fn local_declarations_are_registered_when_reached() {
    assert_ok(
        r#"
fn build() -> int {
    class Local {
        v: int
    }
    let l = new Local { v: 1 };
    return l.v;
}
"#,
    );
}
