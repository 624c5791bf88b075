//! Exercises string identity: two strings built from different
//! concatenations but the same bytes resolve to the same `ObjString`.

#[test]
fn same_bytes_intern_to_the_same_object() {
    let mut interp = buzz_tests::new_interpreter();

    let a = interp.intern_string(&format!("{}{}", "ab", "c"));
    let b = interp.intern_string(&format!("{}{}", "a", "bc"));

    assert_eq!(a.as_ptr(), b.as_ptr());
}

#[test]
fn distinct_bytes_intern_to_distinct_objects() {
    let mut interp = buzz_tests::new_interpreter();

    let a = interp.intern_string("hello");
    let b = interp.intern_string("world");

    assert_ne!(a.as_ptr(), b.as_ptr());
}
