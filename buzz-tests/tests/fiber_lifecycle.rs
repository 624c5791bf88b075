//! Exercises `resume`/`yield`/`over`/`cancel`: a generator yielding 1, 2, 3
//! then returning null, observed from its parent across three resumes plus
//! a final drain.

use buzz_ir::value::Value;
use buzz_vm::fiber;

#[test]
fn generator_yields_then_finishes_with_status_over() {
    let mut interp = buzz_tests::new_interpreter();
    let entry = buzz_tests::alloc_entry_closure(
        &mut interp,
        Some(buzz_ir::placeholder::TypeDefRef::new(
            buzz_ir::types::TypeDef::simple(buzz_ir::types::TypeKind::Number),
        )),
    );
    let root = buzz_tests::spawn_fiber(&mut interp, entry);
    let generator = buzz_tests::spawn_fiber(&mut interp, entry);

    fiber::resume(generator, root, &[]).unwrap();
    assert_eq!(
        fiber::do_yield(generator, Value::Integer(1), true).unwrap(),
        root
    );
    fiber::resume(generator, root, &[]).unwrap();
    assert_eq!(
        fiber::do_yield(generator, Value::Integer(2), true).unwrap(),
        root
    );
    fiber::resume(generator, root, &[]).unwrap();
    assert_eq!(
        fiber::do_yield(generator, Value::Integer(3), true).unwrap(),
        root
    );

    fiber::resume(generator, root, &[]).unwrap();
    fiber::finish(generator, Value::Null);

    assert!(fiber::is_over(generator));
    assert!(matches!(
        fiber::resume(generator, root, &[]),
        Err(fiber::FiberError::ResumeOverFiber)
    ));
}

#[test]
fn yield_outside_a_generator_is_rejected() {
    let mut interp = buzz_tests::new_interpreter();
    let entry = buzz_tests::alloc_entry_closure(&mut interp, None);
    let root = buzz_tests::spawn_fiber(&mut interp, entry);
    let plain = buzz_tests::spawn_fiber(&mut interp, entry);

    fiber::resume(plain, root, &[]).unwrap();
    assert!(matches!(
        fiber::do_yield(plain, Value::Null, false),
        Err(fiber::FiberError::YieldOutsideGenerator)
    ));
}

#[test]
fn cancel_makes_a_fiber_permanently_over() {
    let mut interp = buzz_tests::new_interpreter();
    let entry = buzz_tests::alloc_entry_closure(&mut interp, None);
    let root = buzz_tests::spawn_fiber(&mut interp, entry);
    let child = buzz_tests::spawn_fiber(&mut interp, entry);

    fiber::resume(child, root, &[]).unwrap();
    fiber::cancel(child);

    assert!(fiber::is_over(child));
    assert!(matches!(
        fiber::resume(child, root, &[]),
        Err(fiber::FiberError::ResumeOverFiber)
    ));
}
