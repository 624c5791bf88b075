//! Exercises the write barrier: an old-generation `ObjectInstance` has a
//! field reassigned to a freshly allocated young object; without
//! `mark_dirty` the next young collection would see no root pointing at
//! the new object and free it even though it is live.

use std::cell::Cell;

use buzz_ir::intern;
use buzz_ir::object::{GenLink, ObjHeader, ObjKind, ObjList, ObjObject, ObjObjectInstance};
use buzz_ir::value::Value;
use buzz_vm::heap;

fn promote_everything(interp: &mut buzz_vm::Interpreter) {
    let self_ptr: *const buzz_vm::Interpreter = interp;
    let roots: &buzz_vm::Interpreter = unsafe { &*self_ptr };
    interp.heap.collect_young(roots);
}

#[test]
fn dirty_old_instance_keeps_its_new_young_field_alive() {
    let mut interp = buzz_tests::new_interpreter();

    let class = interp
        .alloc(ObjObject {
            header: ObjHeader::new(ObjKind::Object),
            name: intern::intern("Box"),
            super_class: None,
            fields: vec![],
            methods: vec![],
            static_fields: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let instance = interp
        .alloc(ObjObjectInstance {
            header: ObjHeader::new(ObjKind::ObjectInstance),
            class,
            fields: vec![(intern::intern("x"), Cell::new(Value::Null))],
        })
        .expect("test heap has no max_heap_bytes cap");
    interp
        .globals
        .insert(intern::intern("root"), Value::Obj(instance));

    // First young collection promotes `class`/`instance` into the old
    // generation (they are reachable from the globals root).
    promote_everything(&mut interp);
    assert_eq!(instance.header().gen_link.get(), GenLink::Old);

    // Mutate a field on the now-old instance to point at a brand-new
    // young object, and run the write barrier the mutation requires.
    let fresh_list = interp
        .alloc(ObjList {
            header: ObjHeader::new(ObjKind::List),
            item_type: buzz_ir::placeholder::TypeDefRef::new(buzz_ir::types::TypeDef::simple(
                buzz_ir::types::TypeKind::Number,
            )),
            items: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let inst: &ObjObjectInstance = unsafe { heap::view(instance) };
    inst.fields[0].1.set(Value::Obj(fresh_list));
    interp.heap.mark_dirty(instance);

    // A second young collection must not free `fresh_list`: nothing but
    // the dirty old instance points at it.
    promote_everything(&mut interp);

    assert_eq!(fresh_list.header().gen_link.get(), GenLink::Old);
    let inst_after: &ObjObjectInstance = unsafe { heap::view(instance) };
    match inst_after.fields[0].1.get() {
        Value::Obj(o) => assert_eq!(o.kind(), ObjKind::List),
        other => panic!("expected the list to survive, got {other:?}"),
    }
}
