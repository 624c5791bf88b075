//! Exercises the structural cases `buzz_vm::dispatch::is` finishes beyond
//! the bare `ObjKind` tag `buzz_ir::dispatch::is` can check alone: a list's
//! declared item type, and an upvalue that must be unwrapped (through a
//! live stack slot, since it is still `Open`) before the test can proceed.

use std::cell::Cell;

use buzz_ir::object::{ObjHeader, ObjKind, ObjList, UpValueState};
use buzz_ir::placeholder::TypeDefRef;
use buzz_ir::types::{TypeDef, TypeKind, TypeUnion};
use buzz_ir::value::{ObjRef, Value};
use buzz_vm::dispatch::is;
use buzz_vm::frame::ValueStack;

fn list_type(item: TypeKind) -> TypeDefRef {
    TypeDefRef::new(TypeDef {
        optional: false,
        kind: TypeKind::List,
        payload: Some(TypeUnion::List {
            item: TypeDefRef::new(TypeDef::simple(item)),
        }),
    })
}

#[test]
fn list_is_matches_its_declared_item_type_but_not_another() {
    let mut interp = buzz_tests::new_interpreter();
    let list = interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: TypeDefRef::new(TypeDef::simple(TypeKind::Number)),
            items: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let stack = ValueStack::new();

    assert!(is(&Value::Obj(list), &list_type(TypeKind::Number), &stack));
    assert!(!is(&Value::Obj(list), &list_type(TypeKind::String), &stack));
}

#[test]
fn bare_list_type_with_no_payload_matches_any_item_type() {
    let mut interp = buzz_tests::new_interpreter();
    let list = interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: TypeDefRef::new(TypeDef::simple(TypeKind::Bool)),
            items: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let stack = ValueStack::new();
    let bare_list = TypeDefRef::new(TypeDef::simple(TypeKind::List));

    assert!(is(&Value::Obj(list), &bare_list, &stack));
}

#[test]
fn open_upvalue_is_tested_through_its_live_stack_slot() {
    use buzz_ir::object::ObjUpValue;

    let mut interp = buzz_tests::new_interpreter();
    let mut stack = ValueStack::new();
    stack.push(Value::Integer(7));

    let upvalue: ObjRef = interp
        .alloc(ObjUpValue {
            header: ObjHeader::new(ObjKind::UpValue),
            state: Cell::new(UpValueState::Open { stack_slot: 0 }),
        })
        .expect("test heap has no max_heap_bytes cap");

    let number_ty = TypeDefRef::new(TypeDef::simple(TypeKind::Number));
    let string_ty = TypeDefRef::new(TypeDef::simple(TypeKind::String));

    assert!(is(&Value::Obj(upvalue), &number_ty, &stack));
    assert!(!is(&Value::Obj(upvalue), &string_ty, &stack));
}
