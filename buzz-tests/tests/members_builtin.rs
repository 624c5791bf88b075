//! Exercises the static dispatch table: it resolves a named method for
//! its declaring kind and caches its parsed signature.

use buzz_ir::intern;
use buzz_ir::object::ObjKind;
use buzz_ir::types::{TypeKind, TypeUnion};
use buzz_solve::{MemberTable, TypeRegistry};
use buzz_vm::gc::{GcConfig, Heap};
use buzz_vm::roots::RootSet;

#[test]
fn list_append_resolves_with_a_one_parameter_function_signature() {
    let table = MemberTable::builtin();
    let name = intern::intern("append");

    let member = table.member(ObjKind::List, name).expect("append must exist on list");
    assert_eq!(member.name, name);
}

#[test]
fn member_def_is_cached_across_calls() {
    let mut table = MemberTable::builtin();
    let mut registry = TypeRegistry::new();
    let name = intern::intern("len");

    let first = table
        .member_def(&mut registry, ObjKind::List, name)
        .expect("len must exist on list");
    assert_eq!(first.kind, TypeKind::Function);
    match &first.payload {
        Some(TypeUnion::Function(sig)) => {
            assert!(sig.params.is_empty());
            assert_eq!(sig.return_ty.kind, TypeKind::Number);
        }
        other => panic!("expected a function signature, got {other:?}"),
    }

    let second = table
        .member_def(&mut registry, ObjKind::List, name)
        .unwrap();
    assert!(first.same_object(&second));
}

#[test]
fn unknown_member_is_none() {
    let table = MemberTable::builtin();
    let missing = intern::intern("doesNotExist");
    assert!(table.member(ObjKind::List, missing).is_none());
    assert!(table.member(ObjKind::Map, intern::intern("append")).is_none());
}

#[test]
fn native_is_allocated_once_and_then_cached() {
    let mut table = MemberTable::builtin();
    let mut registry = TypeRegistry::new();
    let mut heap = Heap::new(GcConfig::default());
    let roots = RootSet(Vec::new());
    let name = intern::intern("append");

    let first = table
        .native(&mut registry, &mut heap, &roots, ObjKind::List, name)
        .expect("heap has no configured limit")
        .expect("append must exist on list");
    let second = table
        .native(&mut registry, &mut heap, &roots, ObjKind::List, name)
        .expect("heap has no configured limit")
        .expect("append must exist on list");

    assert_eq!(first.as_ptr(), second.as_ptr());
    assert_eq!(first.kind(), ObjKind::Native);
}

#[test]
fn native_is_none_for_a_member_that_does_not_exist() {
    let mut table = MemberTable::builtin();
    let mut registry = TypeRegistry::new();
    let mut heap = Heap::new(GcConfig::default());
    let roots = RootSet(Vec::new());

    let missing = table
        .native(&mut registry, &mut heap, &roots, ObjKind::List, intern::intern("doesNotExist"))
        .expect("heap has no configured limit");
    assert!(missing.is_none());
}
