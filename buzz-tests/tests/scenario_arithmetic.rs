//! A hand-assembled scenario run end-to-end through a fiber, the way a real
//! compiled function body would execute: push two constants, add them,
//! return. Snapshotted against the step-by-step trace `run_scenario`
//! records, so a change to the arithmetic or return opcodes shows up as a
//! diff at the exact step it diverges rather than a single pass/fail bit.

use buzz_ir::value::Value;
use buzz_vm::OpCode;

#[test]
fn add_two_and_three_returns_five() {
    let mut interp = buzz_tests::new_interpreter();
    let entry = buzz_tests::alloc_entry_closure(&mut interp, None);
    let fiber = buzz_tests::spawn_fiber(&mut interp, entry);

    let ops = vec![
        OpCode::Constant(Value::Integer(2)),
        OpCode::Constant(Value::Integer(3)),
        OpCode::Add,
        OpCode::Return,
    ];
    let trace = buzz_tests::run_scenario(&mut interp, fiber, &ops);

    buzz_tests::assert_snapshot(
        &trace,
        &[
            "Constant(Integer(2))",
            "Constant(Integer(3))",
            "Add",
            "done(Integer(5))",
        ],
    );
}

#[test]
fn division_by_zero_throws_before_reaching_return() {
    let mut interp = buzz_tests::new_interpreter();
    let entry = buzz_tests::alloc_entry_closure(&mut interp, None);
    let fiber = buzz_tests::spawn_fiber(&mut interp, entry);

    let ops = vec![
        OpCode::Constant(Value::Integer(1)),
        OpCode::Constant(Value::Integer(0)),
        OpCode::Div,
        OpCode::Return,
    ];
    let trace = buzz_tests::run_scenario(&mut interp, fiber, &ops);

    assert_eq!(trace.len(), 3);
    assert!(trace.last().unwrap().starts_with("thrown("));
}
