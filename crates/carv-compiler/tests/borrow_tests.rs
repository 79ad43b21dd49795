//! Borrow tracking tests: conflicts, assignment while borrowed, borrows of
//! moved values, dereference and escaping references.

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

fn warnings_with(report: &CheckReport, code: ErrorCode) -> Vec<String> {
    report
        .warnings
        .iter()
        .filter(|w| w.code == code)
        .map(|w| w.message.clone())
        .collect()
}

/// Assert the program checks cleanly and warns with `code` exactly `n` times.
fn assert_n_warnings(source: &str, code: ErrorCode, n: usize) -> Vec<String> {
    let report = check(source);
    assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
    let found = warnings_with(&report, code);
    assert_eq!(
        found.len(),
        n,
        "expected {n} {code} warning(s), got {:?}",
        report.warnings
    );
    found
}

fn assert_clean(source: &str) {
    let report = check(source);
    assert!(
        report.errors.is_empty() && report.warnings.is_empty(),
        "expected no diagnostics, got errors {:?} warnings {:?}",
        report.errors,
        report.warnings
    );
}

const POINT: &str = r#"
class Point {
    x: int,
    y: int
    fn norm(&self) -> int {
        return self.x * self.x + self.y * self.y;
    }
    fn shift(&mut self, dx: int) {
        self.x += dx;
    }
}
"#;

// ══════════════════════════════════════════════════════════════════════════════
// Conflicts
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn shared_borrows_coexist() {
    assert_clean(
        r#"
let x = 1;
let a = &x;
let b = &x;
let c = &x;
"#,
    );
}

#[test]
fn mutable_after_shared() {
    let found = assert_n_warnings(
        r#"
let x = 1;
let r = &x;
let m = &mut x;
"#,
        ErrorCode::BORROW_CONFLICT,
        1,
    );
    assert_eq!(found[0], "cannot mutably borrow: already immutably borrowed");
}

#[test]
fn mutable_after_mutable() {
    let found = assert_n_warnings(
        r#"
let x = 1;
let a = &mut x;
let b = &mut x;
"#,
        ErrorCode::BORROW_CONFLICT,
        1,
    );
    assert_eq!(found[0], "cannot mutably borrow: already mutably borrowed");
}

#[test]
fn shared_after_mutable() {
    let found = assert_n_warnings(
        r#"
let x = 1;
let m = &mut x;
let r = &x;
"#,
        ErrorCode::BORROW_CONFLICT,
        1,
    );
    assert_eq!(found[0], "cannot immutably borrow: already mutably borrowed");
}

#[test]
fn conflicting_borrow_is_still_recorded() {
    // the second &mut conflicts with both the shared and the first mutable
    assert_n_warnings(
        r#"
let x = 1;
let r = &x;
let a = &mut x;
let b = &mut x;
"#,
        ErrorCode::BORROW_CONFLICT,
        3,
    );
}

#[test]
fn borrows_end_with_their_block() {
    assert_clean(
        r#"
let x = 1;
if true {
    let m = &mut x;
}
let again = &mut x;
"#,
    );
    assert_clean(
        r#"
let x = 1;
fn peek() {
    let r = &x;
}
let m = &mut x;
"#,
    );
}

#[test]
fn borrows_are_per_binding() {
    assert_clean(
        r#"
let a = 1;
let b = 2;
let ra = &mut a;
let rb = &mut b;
"#,
    );
}

#[test]
fn field_borrows_are_not_tracked() {
    assert_clean(&format!(
        r#"{POINT}
let p = new Point {{ x: 1, y: 2 }};
let a = &p.x;
let b = &mut p.x;
"#
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Assignment while borrowed & borrows of moved values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn assign_while_borrowed() {
    let found = assert_n_warnings(
        r#"
let x = 1;
let r = &x;
x = 2;
"#,
        ErrorCode::ASSIGN_WHILE_BORROWED,
        1,
    );
    assert_eq!(found[0], "cannot assign to 'x' while it is borrowed");
}

#[test]
fn assign_after_borrow_scope_ends() {
    assert_clean(
        r#"
let x = 1;
{
    let r = &x;
}
x = 2;
"#,
    );
}

#[test]
fn borrow_of_moved_value() {
    let found = assert_n_warnings(
        r#"
let s = "a";
let t = s;
let r = &s;
"#,
        ErrorCode::BORROW_OF_MOVED,
        1,
    );
    assert_eq!(found[0], "cannot borrow moved value 's'");
}

#[test]
fn borrow_does_not_move() {
    assert_clean(
        r#"
let s = "a";
let r = &s;
let len_s = len(*r);
"#,
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// References
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn deref_yields_inner_type() {
    assert_clean(
        r#"
let x = 1;
let r = &x;
let v: int = *r;
"#,
    );
}

#[test]
fn deref_of_non_reference_warns() {
    let found = assert_n_warnings(
        r#"
let n = 5;
let v = *n;
"#,
        ErrorCode::INVALID_DEREF,
        1,
    );
    assert_eq!(found[0], "cannot dereference non-reference type int");
}

#[test]
fn reference_assignability() {
    assert_clean(
        r#"
let x = 1;
let r: &int = &mut x;
"#,
    );
    let report = check(
        r#"
let x = 1;
let m: &mut int = &x;
"#,
    );
    assert!(report.has_code(ErrorCode::TYPE_MISMATCH));
    assert!(!report.is_ok());
}

#[test]
fn returned_reference_escapes() {
    assert_n_warnings(
        r#"
fn leak(x: int) -> &int {
    return &x;
}
"#,
        ErrorCode::REFERENCE_ESCAPES,
        1,
    );
    assert_n_warnings(
        r#"
fn pass(r: &int) -> &int {
    return r;
}
"#,
        ErrorCode::REFERENCE_ESCAPES,
        1,
    );
}

#[test]
fn reading_through_shared_reference() {
    assert_clean(&format!(
        r#"{POINT}
fn get_x(p: &Point) -> int {{
    return p.x + p.norm();
}}
"#
    ));
}

#[test]
fn field_assignment_through_shared_reference() {
    let found = assert_n_warnings(
        &format!(
            r#"{POINT}
fn reset(p: &Point) {{
    p.x = 0;
}}
"#
        ),
        ErrorCode::MUTATION_THROUGH_SHARED_REF,
        1,
    );
    assert_eq!(found[0], "cannot assign to field 'x' through a shared reference");
}

#[test]
fn field_assignment_through_mutable_reference() {
    assert_clean(&format!(
        r#"{POINT}
fn reset(p: &mut Point) {{
    p.x = 0;
    p.shift(1);
}}
"#
    ));
}

#[test]
fn mut_method_through_shared_reference() {
    assert_n_warnings(
        &format!(
            r#"{POINT}
fn nudge(p: &Point) {{
    p.shift(1);
}}
"#
        ),
        ErrorCode::MUTATION_THROUGH_SHARED_REF,
        1,
    );
}

#[test]
fn shared_self_cannot_mutate_fields() {
    assert_n_warnings(
        r#"
class Counter {
    n: int
    fn bump(&self) {
        self.n += 1;
    }
}
"#,
        ErrorCode::MUTATION_THROUGH_SHARED_REF,
        1,
    );
}

#[test]
fn borrow_issues_never_block() {
    let report = check(
        r#"
let x = 1;
let r = &x;
let m = &mut x;
x = 5;
let bad = *x;
"#,
    );
    assert!(report.is_ok());
    assert!(report.warnings.len() >= 3);
}
