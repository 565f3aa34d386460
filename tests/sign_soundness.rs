//! Sign-lattice soundness checks (§8 "Soundness of the sign analyzer"):
//! every verdict the concrete interpreter can actually reach under some
//! input must appear in the sign analyzer's verdict set (over-approximation
//! is fine, missing a real verdict is not).

mod common;

use std::collections::BTreeSet;

use vm_analyzer::{analyze_signs, Verdict};

#[test]
fn array_access_soundness_includes_index_out_of_bounds() {
    let table = common::array_class();
    let verdicts = analyze_signs(&table, "Array", "access").unwrap();
    assert!(verdicts.contains(&Verdict::IndexOutOfBounds));
}

#[test]
fn array_access_safe_soundness_includes_assertion_error() {
    let table = common::array_class();
    let verdicts = analyze_signs(&table, "Array", "accessSafe").unwrap();
    assert!(verdicts.contains(&Verdict::AssertionError));
    assert!(verdicts.contains(&Verdict::IndexOutOfBounds));
}

#[test]
fn always_throws_soundness_includes_arithmetic_exception() {
    let table = common::arithmetics_class();
    let verdicts = analyze_signs(&table, "Arithmetics", "alwaysThrows3").unwrap();
    assert!(verdicts.contains(&Verdict::ArithmeticException));
}

#[test]
fn factorial_has_no_reachable_exception_under_the_abstraction() {
    // factorial never divides, indexes an array, or throws: the sign
    // analyzer's verdict set should be exactly `{No}`.
    let table = common::simple_class();
    let verdicts = analyze_signs(&table, "Simple", "factorial").unwrap();
    let expected: BTreeSet<Verdict> = [Verdict::No].into_iter().collect();
    assert_eq!(verdicts, expected);
}

#[test]
fn fib_is_intraprocedural_and_terminates_at_every_invoke() {
    // `invoke` is treated as an opaque stub in sign mode (no recursive
    // re-entry into the callee's own analysis), so this must not loop.
    let table = common::calls_class();
    let verdicts = analyze_signs(&table, "Calls", "fib").unwrap();
    assert!(verdicts.contains(&Verdict::No));
}
