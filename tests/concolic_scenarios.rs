//! §8 scenarios 6-7: the concolic search loop.

mod common;

use vm_analyzer::{concolic, Verdict, Witness};

#[test]
fn always_throws_finds_the_dividing_by_zero_path() {
    let table = common::arithmetics_class();
    let report = concolic(&table, "Arithmetics", "alwaysThrows3").unwrap();
    assert_eq!(report.verdict, Verdict::ArithmeticException);
    // `alwaysThrows3(a, b)` divides `a / b`; the witness must pin down the
    // actual triggering divisor, not just any argument assignment.
    match report.witness {
        Some(Witness::ConcreteArgs(args)) => assert_eq!(args[1], 0, "divisor argument should be 0, got {:?}", args),
        other => panic!("expected a ConcreteArgs witness with b=0, got {:?}", other),
    }
}

#[test]
fn never_throws_exhausts_the_search_with_no() {
    let table = common::arithmetics_class();
    let report = concolic(&table, "Arithmetics", "neverThrows5").unwrap();
    assert_eq!(report.verdict, Verdict::No);
}
