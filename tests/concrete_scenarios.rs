//! End-to-end concrete-semantics scenarios (§8 scenarios 1-5).

mod common;

use pretty_assertions::assert_eq;

use vm_analyzer::dispatcher::RunOutcome;
use vm_analyzer::value::{Seed, Value};
use vm_analyzer::{run_method, run_method_with_output, Verdict};

fn expect_int(outcome: RunOutcome<Value>) -> i32 {
    match outcome {
        RunOutcome::Returned(Value::Int(n)) => n,
        RunOutcome::Returned(other) => panic!("expected Int, got {:?}", other),
        RunOutcome::Excepted(v) => panic!("expected a return, got verdict {}", v),
    }
}

fn expect_verdict(outcome: RunOutcome<Value>) -> Verdict {
    match outcome {
        RunOutcome::Excepted(v) => v,
        RunOutcome::Returned(v) => panic!("expected an exception, got return {}", v),
    }
}

#[test]
fn factorial_matches_reference_values() {
    let table = common::simple_class();
    assert_eq!(expect_int(run_method(&table, "Simple", "factorial", &[Seed::Int(5)]).unwrap()), 120);
    assert_eq!(expect_int(run_method(&table, "Simple", "factorial", &[Seed::Int(6)]).unwrap()), 720);
    assert_eq!(expect_int(run_method(&table, "Simple", "factorial", &[Seed::Int(1)]).unwrap()), 1);
}

#[test]
fn min_picks_the_smaller_operand() {
    let table = common::simple_class();
    let min = |a: i32, b: i32| expect_int(run_method(&table, "Simple", "min", &[Seed::Int(a), Seed::Int(b)]).unwrap());
    assert_eq!(min(-1, 1), -1);
    assert_eq!(min(1, -1), -1);
    assert_eq!(min(1, 1), 1);
}

#[test]
fn array_access_in_bounds_and_out_of_bounds() {
    let table = common::array_class();
    let arr = Seed::IntArray(vec![0, 1, 3]);
    let ok = run_method(&table, "Array", "access", &[Seed::Int(2), arr.clone()]).unwrap();
    assert_eq!(expect_int(ok), 3);

    let oob = run_method(&table, "Array", "access", &[Seed::Int(-1), arr]).unwrap();
    assert_eq!(expect_verdict(oob), Verdict::IndexOutOfBounds);
}

#[test]
fn array_access_safe_raises_assertion_error_out_of_range() {
    let table = common::array_class();
    let arr = Seed::IntArray(vec![0, 1, 3]);
    let outcome = run_method(&table, "Array", "accessSafe", &[Seed::Int(3), arr]).unwrap();
    assert_eq!(expect_verdict(outcome), Verdict::AssertionError);
}

#[test]
fn bubble_sort_mutates_the_array_in_place() {
    use vm_analyzer::class_table::{ClassProvider, Resolution};

    let table = common::array_class();
    let instructions = match ClassProvider::method(&table, "Array", "bubbleSort") {
        Resolution::Known(desc) => desc.instructions.clone(),
        _ => panic!("bubbleSort not found"),
    };

    let mut semantics = vm_analyzer::semantics::concrete::ConcreteSemantics::new();
    let locals = semantics.wrap(&[Seed::IntArray(vec![3, 1, 2])]);
    let code = std::rc::Rc::new(instructions);
    let mut dispatcher = vm_analyzer::dispatcher::Dispatcher::new(
        &table,
        vm_analyzer::frame::MethodId::new("Array", "bubbleSort"),
        code,
        locals.clone(),
        semantics,
    );
    let outcome = dispatcher.run().unwrap();
    assert!(matches!(outcome, RunOutcome::Returned(Value::Void)));

    let arr_id = locals[0].as_ref().unwrap();
    let heap = dispatcher.semantics.heap();
    match heap.get(arr_id) {
        vm_analyzer::heap::HeapObject::Array { cells, .. } => {
            let sorted: Vec<i32> = cells.iter().map(|v| v.as_i32().unwrap()).collect();
            assert_eq!(sorted, vec![1, 2, 3]);
        }
        _ => panic!("expected array"),
    }
}

#[test]
fn fib_matches_shifted_sequence_and_hello_world_prints() {
    let table = common::calls_class();
    assert_eq!(expect_int(run_method(&table, "Calls", "fib", &[Seed::Int(6)]).unwrap()), 13);
    assert_eq!(expect_int(run_method(&table, "Calls", "fib", &[Seed::Int(0)]).unwrap()), 1);

    let (_, output) = run_method_with_output(&table, "Calls", "helloWorld", &[]).unwrap();
    assert_eq!(output, "Hello, World!\n");
}
