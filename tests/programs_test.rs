//! End-to-end tests: source text in, integer out.

mod common;

use common::*;

#[test]
fn factorial_reference_values() {
    assert_eval!(FACTORIAL, 5, 120);
    assert_eval!(FACTORIAL, 8, 40320);
    assert_eval!(FACTORIAL, 0, 1);
}

#[test]
fn factorial_from_file() {
    let program = minivm::load_source(demo("fac.mini")).unwrap();
    assert_eq!(
        bytecode(&program).to_string(),
        "13 3 15 2 1 1 0 9 14 1 1 14 12 25 2 1 2 1 1 1 5 13 3 6 14 0 "
    );
    assert_eval!(&program, 8, 40320);
}

#[test]
fn loops_and_locals() {
    let gcd = minivm::load_source(demo("gcd.mini")).unwrap();
    assert_eval!(&gcd, 18, 6);
    assert_eval!(&gcd, 0, 48);

    let fib = minivm::load_source(demo("fib.mini")).unwrap();
    assert_eval!(&fib, 10, 55);
}

#[test]
fn while_with_false_condition_never_runs() {
    let program = "f(x) { while (x < 0) x = x + 1; return x; }";
    for x in [0, 1, 17] {
        assert_eval!(program, x, x);
    }
}

#[test]
fn if_else_runs_exactly_one_branch() {
    let program = "f(x) { c = 0; if (x > 0) c = c + 1; else c = c + 2; return c; }";
    assert_eval!(program, 5, 1);
    assert_eval!(program, 0, 2);
    assert_eval!(program, -5, 2);
}

#[test]
fn nested_blocks_and_empty_statements() {
    let program = "f(x) { ; { { y = x * 2; } ; } return y + 1; }";
    assert_eval!(program, 4, 9);
}

#[test]
fn recursion_through_expression_arguments() {
    // sum of 1..=n through self calls
    let program = "s(n) { if (n == 0) return 0; else return n + s(n - 1); }";
    assert_eval!(program, 100, 5050);
}

#[test]
fn multiplicative_chains_group_to_the_right() {
    assert_eval!("f(x) { return 100 / 10 / 5; }", 0, 50);
    assert_eval!("f(x) { return 2 * 3 * 4; }", 0, 24);
    assert_eval!("f(x) { return (100 / 10) / 5; }", 0, 2);
}
