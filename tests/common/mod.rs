//! Shared fixture builders: each of these hand-assembles one method's
//! `Instruction` stream directly, the same way the pack's own VM tests
//! build `Instr` vectors by hand rather than parsing source (see
//! `AtelierArith-julia-vm-oss`'s `tests/integration_array_tests.rs`).

#![allow(dead_code)]

use vm_analyzer::class_table::{ClassTable, MethodDescriptor, ParamKind};
use vm_analyzer::instr::{BinOp, Condition, Instruction, Literal};

fn method(name: &str, params: Vec<ParamKind>, returns: bool, instructions: Vec<Instruction>, locals_count: usize) -> MethodDescriptor {
    MethodDescriptor { name: name.to_string(), params, returns, instructions, locals_count }
}

/// `Simple.factorial(n)` / `Simple.min(a, b)` (§8 scenarios 1-2).
pub fn simple_class() -> ClassTable {
    let factorial = method(
        "factorial",
        vec![ParamKind::Int],
        true,
        vec![
            Instruction::Push(Literal::Int(1)),       // 0
            Instruction::Store(1),                     // 1  result = 1
            Instruction::Load(0),                       // 2  loop: n
            Instruction::Ifz(Condition::Le, 10),          // 3  if n <= 0 goto 10
            Instruction::Load(1),                          // 4
            Instruction::Load(0),                           // 5
            Instruction::Binary(BinOp::Mul),                 // 6  result * n
            Instruction::Store(1),                            // 7
            Instruction::Incr { index: 0, amount: -1 },        // 8  n--
            Instruction::Goto(2),                               // 9
            Instruction::Load(1),                                // 10
            Instruction::Return(true),                            // 11
        ],
        2,
    );
    let min = method(
        "min",
        vec![ParamKind::Int, ParamKind::Int],
        true,
        vec![
            Instruction::Load(0),         // 0  a
            Instruction::Load(1),          // 1  b
            Instruction::If(Condition::Le, 5), // 2  if a <= b goto 5
            Instruction::Load(1),               // 3  b
            Instruction::Goto(6),                // 4
            Instruction::Load(0),                 // 5  a
            Instruction::Return(true),             // 6
        ],
        2,
    );
    let mut table = ClassTable::new();
    table.insert_class("Simple", vec![factorial, min]);
    table
}

/// `Array.access(index, arr)` / `Array.accessSafe(index, arr)` /
/// `Array.bubbleSort(arr)` (§8 scenarios 3-4).
pub fn array_class() -> ClassTable {
    let access = method(
        "access",
        vec![ParamKind::Int, ParamKind::IntArray],
        true,
        vec![
            Instruction::Load(1),    // 0  arr
            Instruction::Load(0),     // 1  index
            Instruction::ArrayLoad,    // 2
            Instruction::Return(true), // 3
        ],
        2,
    );
    let access_safe = method(
        "accessSafe",
        vec![ParamKind::Int, ParamKind::IntArray],
        true,
        vec![
            Instruction::Load(0),                        // 0  index
            Instruction::Ifz(Condition::Ge, 4),            // 1  if index >= 0 goto 4
            Instruction::New("AssertionError".to_string()), // 2
            Instruction::Throw,                              // 3
            Instruction::Load(0),                             // 4  index
            Instruction::Load(1),                              // 5  arr
            Instruction::ArrayLength,                           // 6
            Instruction::If(Condition::Lt, 10),                  // 7  if index < length goto 10
            Instruction::New("AssertionError".to_string()),       // 8
            Instruction::Throw,                                    // 9
            Instruction::Load(1),                                   // 10 arr
            Instruction::Load(0),                                    // 11 index
            Instruction::ArrayLoad,                                   // 12
            Instruction::Return(true),                                // 13
        ],
        2,
    );
    let bubble_sort = method(
        "bubbleSort",
        vec![ParamKind::IntArray],
        false,
        vec![
            Instruction::Load(1),                    // 0   L_OUTER_COND: i
            Instruction::Load(0),                     // 1   arr
            Instruction::ArrayLength,                  // 2
            Instruction::If(Condition::Lt, 5),          // 3   if i < length goto 5
            Instruction::Goto(46),                       // 4   else goto END
            Instruction::Push(Literal::Int(0)),           // 5   L_OUTER_BODY
            Instruction::Store(2),                         // 6   j = 0
            Instruction::Load(2),                           // 7   L_INNER_COND: j
            Instruction::Push(Literal::Int(1)),              // 8
            Instruction::Binary(BinOp::Add),                  // 9   j + 1
            Instruction::Load(0),                              // 10  arr
            Instruction::ArrayLength,                           // 11
            Instruction::If(Condition::Lt, 14),                  // 12  if j+1 < length goto 14
            Instruction::Goto(44),                                // 13  else goto INNER_END
            Instruction::Load(0),                                  // 14  L_INNER_BODY: arr
            Instruction::Load(2),                                   // 15  j
            Instruction::ArrayLoad,                                   // 16  arr[j]
            Instruction::Load(0),                                      // 17  arr
            Instruction::Load(2),                                       // 18  j
            Instruction::Push(Literal::Int(1)),                          // 19
            Instruction::Binary(BinOp::Add),                              // 20  j + 1
            Instruction::ArrayLoad,                                        // 21  arr[j+1]
            Instruction::If(Condition::Gt, 24),                             // 22  if arr[j] > arr[j+1] goto SWAP
            Instruction::Goto(42),                                           // 23  else goto INNER_INCR
            Instruction::Load(0),                                            // 24  SWAP: arr
            Instruction::Load(2),                                             // 25  j
            Instruction::ArrayLoad,                                           // 26  arr[j]
            Instruction::Store(3),                                            // 27  tmp = arr[j]
            Instruction::Load(0),                                             // 28  arr
            Instruction::Load(2),                                             // 29  j
            Instruction::Load(0),                                             // 30  arr
            Instruction::Load(2),                                             // 31  j
            Instruction::Push(Literal::Int(1)),                               // 32
            Instruction::Binary(BinOp::Add),                                   // 33  j + 1
            Instruction::ArrayLoad,                                            // 34  arr[j+1]
            Instruction::ArrayStore,                                           // 35  arr[j] = arr[j+1]
            Instruction::Load(0),                                              // 36  arr
            Instruction::Load(2),                                              // 37  j
            Instruction::Push(Literal::Int(1)),                                // 38
            Instruction::Binary(BinOp::Add),                                    // 39  j + 1
            Instruction::Load(3),                                               // 40  tmp
            Instruction::ArrayStore,                                            // 41  arr[j+1] = tmp
            Instruction::Incr { index: 2, amount: 1 },                           // 42  INNER_INCR: j++
            Instruction::Goto(7),                                                // 43
            Instruction::Incr { index: 1, amount: 1 },                            // 44  INNER_END: i++
            Instruction::Goto(0),                                                  // 45
            Instruction::Return(false),                                           // 46  END
        ],
        4,
    );
    let mut table = ClassTable::new();
    table.insert_class("Array", vec![access, access_safe, bubble_sort]);
    table
}

/// `Calls.fib(n)` (recursive) / `Calls.helloWorld()` (§8 scenario 5).
pub fn calls_class() -> ClassTable {
    let fib = method(
        "fib",
        vec![ParamKind::Int],
        true,
        vec![
            Instruction::Load(0),           // 0
            Instruction::Push(Literal::Int(1)), // 1
            Instruction::If(Condition::Gt, 5),   // 2  if n > 1 goto 5
            Instruction::Push(Literal::Int(1)),    // 3  base case: 1
            Instruction::Return(true),               // 4
            Instruction::Load(0),                     // 5
            Instruction::Push(Literal::Int(1)),        // 6
            Instruction::Binary(BinOp::Sub),            // 7  n - 1
            Instruction::Invoke {
                class: "Calls".to_string(),
                method: "fib".to_string(),
                arity: 1,
                returns: true,
            }, // 8
            Instruction::Load(0),   // 9
            Instruction::Push(Literal::Int(2)), // 10
            Instruction::Binary(BinOp::Sub),     // 11  n - 2
            Instruction::Invoke {
                class: "Calls".to_string(),
                method: "fib".to_string(),
                arity: 1,
                returns: true,
            }, // 12
            Instruction::Binary(BinOp::Add), // 13
            Instruction::Return(true),        // 14
        ],
        1,
    );
    let hello_world = method(
        "helloWorld",
        vec![],
        false,
        vec![
            Instruction::Push(Literal::Str("Hello, World!".to_string())),
            Instruction::Print,
            Instruction::Return(false),
        ],
        0,
    );
    let mut table = ClassTable::new();
    table.insert_class("Calls", vec![fib, hello_world]);
    table
}

/// `Arithmetics.alwaysThrows3(a, b)` / `Arithmetics.neverThrows5(a, b)`
/// (§8 scenarios 6-7).
pub fn arithmetics_class() -> ClassTable {
    let always_throws3 = method(
        "alwaysThrows3",
        vec![ParamKind::Int, ParamKind::Int],
        true,
        vec![
            Instruction::Load(0),
            Instruction::Load(1),
            Instruction::Binary(BinOp::Div),
            Instruction::Return(true),
        ],
        2,
    );
    let never_throws5 = method(
        "neverThrows5",
        vec![ParamKind::Int, ParamKind::Int],
        true,
        vec![
            Instruction::Load(0),
            Instruction::Load(1),
            Instruction::Binary(BinOp::Add),
            Instruction::Return(true),
        ],
        2,
    );
    let mut table = ClassTable::new();
    table.insert_class("Arithmetics", vec![always_throws3, never_throws5]);
    table
}
