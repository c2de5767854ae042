use dust::{CollectStringPrint, DustError, RunErrorKind};
use pretty_assertions::assert_eq;

fn run(src: &str) -> String {
    let mut out = CollectStringPrint::default();
    dust::run(src, &mut out).expect("program should run without error");
    out.buffer
}

fn run_err(src: &str) -> RunErrorKind {
    let mut out = CollectStringPrint::default();
    match dust::run(src, &mut out) {
        Err(DustError::Run(e)) => e.kind,
        other => panic!("expected a RunError, got {other:?}"),
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(run("let x = 1 + 2 * 3 ** 2; print(x);"), "19\n");
}

#[test]
fn closures() {
    assert_eq!(
        run("fn make(a) { fn inner(b) { return a + b; } return inner; } let f = make(10); print(f(5));"),
        "15\n"
    );
}

#[test]
fn struct_fields() {
    assert_eq!(run("struct P { x, y, }; let p = P{x: 1, y: 2}; p.x = 7; print(p.x + p.y);"), "9\n");
}

#[test]
fn arrays_and_for() {
    assert_eq!(run("let xs = [1,2,3]; let s = 0; for e in xs { s = s + e; } print(s);"), "6\n");
}

#[test]
fn missing_field_error() {
    assert_eq!(run_err("struct R { a, b, }; let r = R{a: 1};"), RunErrorKind::MissingField);
}

#[test]
fn reassigning_immutable_error() {
    assert_eq!(run_err("fn g() {} g = 1;"), RunErrorKind::Immutable);
}

#[test]
fn division_by_zero_never_produces_infinity_or_nan() {
    assert_eq!(run_err("let x = 1 / 0;"), RunErrorKind::DivisionByZero);
    assert_eq!(run_err("let x = 1.0 / 0;"), RunErrorKind::DivisionByZero);
    assert_eq!(run_err("let x = 1 % 0;"), RunErrorKind::DivisionByZero);
}

#[test]
fn array_and_string_index_bounds_checked() {
    assert_eq!(run_err("let xs = [1,2]; let y = xs[5];"), RunErrorKind::IndexOutOfRange);
    assert_eq!(run_err(r#"let s = "ab"; let y = s[9];"#), RunErrorKind::IndexOutOfRange);
}

#[test]
fn in_bounds_array_access_never_fails() {
    assert_eq!(run("let xs = [10, 20, 30]; print(xs[0]); print(xs[2]);"), "10\n30\n");
}

#[test]
fn struct_literal_accepted_only_when_field_set_matches() {
    assert_eq!(run("struct P { x, y, }; let p = P{x: 1, y: 2}; print(p.x);"), "1\n");
    assert_eq!(run_err("struct P { x, y, }; let p = P{x: 1};"), RunErrorKind::MissingField);
    assert_eq!(run_err("struct P { x, y, }; let p = P{x: 1, y: 2, z: 3};"), RunErrorKind::NoSuchField);
}

#[test]
fn logical_operators_are_not_short_circuit() {
    // Both sides evaluate even when the left side already determines the
    // result; side effects from both `print` calls must appear.
    assert_eq!(
        run("fn t() { print(1); return true; } fn f() { print(2); return false; } let r = f() && t(); print(r);"),
        "2\n1\nfalse\n"
    );
}

#[test]
fn recursive_function_sums_to_limit() {
    assert_eq!(run("fn sum(n) { if n <= 0 { return 0; } return n + sum(n - 1); } print(sum(5));"), "15\n");
}

#[test]
fn for_over_string_yields_chars_not_bytes() {
    assert_eq!(run(r#"let count = 0; for c in "abc" { count = count + 1; } print(count);"#), "3\n");
}

#[test]
fn parse_errors_surface_as_dust_error_parse() {
    let mut out = CollectStringPrint::default();
    let err = dust::run("let x = ;", &mut out).unwrap_err();
    assert!(matches!(err, DustError::Parse(_)));
}
