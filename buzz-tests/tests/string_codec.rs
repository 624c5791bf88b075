//! Exercises the base64 round-trip law:
//! `string(encodeBase64(s)).decodeBase64() == s`.

use buzz_ir::value::Value;
use buzz_tests::NativeHarness;
use buzz_vm::natives;

fn round_trip(interp: &mut buzz_vm::Interpreter, input: &str) -> String {
    let s = interp.intern_string(input);

    let mut encode_ctx = NativeHarness::new(interp, vec![Value::Obj(s)]);
    assert_eq!(natives::string_encode_base64(&mut encode_ctx), 1);
    let encoded = encode_ctx.pushed.pop().unwrap().as_obj().unwrap();

    let mut decode_ctx = NativeHarness::new(interp, vec![Value::Obj(encoded)]);
    assert_eq!(natives::string_decode_base64(&mut decode_ctx), 1);
    let decoded = decode_ctx.pushed.pop().unwrap().as_obj().unwrap();

    let obj: &buzz_ir::object::ObjString = unsafe { buzz_vm::heap::view(decoded) };
    buzz_ir::intern::text(obj.value)
}

#[test]
fn base64_round_trips_ascii_text() {
    let mut interp = buzz_tests::new_interpreter();
    assert_eq!(round_trip(&mut interp, "hello, buzz!"), "hello, buzz!");
}

#[test]
fn base64_round_trips_non_multiple_of_three_lengths() {
    let mut interp = buzz_tests::new_interpreter();
    for input in ["a", "ab", "abc", "abcd", ""] {
        assert_eq!(round_trip(&mut interp, input), input);
    }
}

#[test]
fn sub_extracts_a_utf8_aware_slice() {
    let mut interp = buzz_tests::new_interpreter();
    let s = interp.intern_string("héllo");

    let mut ctx = NativeHarness::new(&mut interp, vec![Value::Obj(s), Value::Integer(1), Value::Integer(2)]);
    assert_eq!(natives::string_sub(&mut ctx), 1);
    let result = ctx.pushed.pop().unwrap().as_obj().unwrap();
    let obj: &buzz_ir::object::ObjString = unsafe { buzz_vm::heap::view(result) };
    assert_eq!(buzz_ir::intern::text(obj.value), "él");
}
