//! Exercises the out-of-bound case (`[1,2,3].sub(5,1)` raises) and the
//! `sub`/`join` round-trip law for a list of strings.

use buzz_ir::object::{ObjHeader, ObjKind, ObjList};
use buzz_ir::placeholder::TypeDefRef;
use buzz_ir::types::{TypeDef, TypeKind};
use buzz_ir::value::{ObjRef, Value};
use buzz_tests::NativeHarness;
use buzz_vm::natives;
use buzz_vm::Interpreter;

fn alloc_string_list(interp: &mut Interpreter, items: &[&str]) -> ObjRef {
    let values = items
        .iter()
        .map(|s| Value::Obj(interp.intern_string(s)))
        .collect();
    interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: TypeDefRef::new(TypeDef::simple(TypeKind::String)),
            items: values,
        })
        .expect("test heap has no max_heap_bytes cap")
}

#[test]
fn sub_raises_out_of_bound_for_a_start_past_the_end() {
    let mut interp = buzz_tests::new_interpreter();
    let list_of_numbers = interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: TypeDefRef::new(TypeDef::simple(TypeKind::Number)),
            items: vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        })
        .expect("test heap has no max_heap_bytes cap");

    let mut ctx = NativeHarness::new(
        &mut interp,
        vec![Value::Obj(list_of_numbers), Value::Integer(5), Value::Integer(1)],
    );
    let status = natives::list_sub(&mut ctx);

    assert_eq!(status, -1);
    let raised = ctx.raised.expect("expected an exception to be raised");
    match raised {
        Value::Obj(o) => {
            let s: &buzz_ir::object::ObjString = unsafe { buzz_vm::heap::view(o) };
            assert!(buzz_ir::intern::text(s.value).contains("start"));
        }
        other => panic!("expected a string exception, got {other:?}"),
    }
}

#[test]
fn sub_then_join_round_trips_a_string_list() {
    let mut interp = buzz_tests::new_interpreter();
    let list = alloc_string_list(&mut interp, &["a", "b", "c"]);

    let mut sub_ctx = NativeHarness::new(
        &mut interp,
        vec![Value::Obj(list), Value::Integer(0), Value::Null],
    );
    assert_eq!(natives::list_sub(&mut sub_ctx), 1);
    let sub_list = sub_ctx.pushed.pop().unwrap().as_obj().unwrap();

    let sep = interp.intern_string("");
    let mut join_ctx = NativeHarness::new(&mut interp, vec![Value::Obj(sub_list), Value::Obj(sep)]);
    assert_eq!(natives::list_join(&mut join_ctx), 1);
    let joined = join_ctx.pushed.pop().unwrap().as_obj().unwrap();
    let s: &buzz_ir::object::ObjString = unsafe { buzz_vm::heap::view(joined) };
    assert_eq!(buzz_ir::intern::text(s.value), "abc");
}

#[test]
fn append_then_len_reflects_the_new_item() {
    let mut interp = buzz_tests::new_interpreter();
    let list = interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: TypeDefRef::new(TypeDef::simple(TypeKind::Number)),
            items: vec![Value::Integer(1)],
        })
        .expect("test heap has no max_heap_bytes cap");

    let mut append_ctx = NativeHarness::new(&mut interp, vec![Value::Obj(list), Value::Integer(2)]);
    assert_eq!(natives::list_append(&mut append_ctx), 1);

    let mut len_ctx = NativeHarness::new(&mut interp, vec![Value::Obj(list)]);
    assert_eq!(natives::list_len(&mut len_ctx), 1);
    assert!(matches!(len_ctx.pushed.pop(), Some(Value::Integer(2))));
}
