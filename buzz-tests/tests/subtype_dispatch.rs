//! Exercises the class hierarchy: an instance of `B` (which extends `A`)
//! is-a `A` by walking the super chain, but an unrelated class is not.

use buzz_ir::intern;
use buzz_ir::object::{ObjHeader, ObjKind, ObjObject, ObjObjectInstance};
use buzz_vm::dispatch::is_instance_of_class;

#[test]
fn instance_of_subclass_matches_superclass() {
    let mut interp = buzz_tests::new_interpreter();

    let class_a = interp
        .alloc(ObjObject {
            header: ObjHeader::new(ObjKind::Object),
            name: intern::intern("A"),
            super_class: None,
            fields: vec![],
            methods: vec![],
            static_fields: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let class_b = interp
        .alloc(ObjObject {
            header: ObjHeader::new(ObjKind::Object),
            name: intern::intern("B"),
            super_class: Some(class_a),
            fields: vec![],
            methods: vec![],
            static_fields: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");
    let class_c = interp
        .alloc(ObjObject {
            header: ObjHeader::new(ObjKind::Object),
            name: intern::intern("C"),
            super_class: None,
            fields: vec![],
            methods: vec![],
            static_fields: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");

    let instance_b = interp
        .alloc(ObjObjectInstance {
            header: ObjHeader::new(ObjKind::ObjectInstance),
            class: class_b,
            fields: vec![],
        })
        .expect("test heap has no max_heap_bytes cap");

    assert!(is_instance_of_class(instance_b, class_b));
    assert!(is_instance_of_class(instance_b, class_a));
    assert!(!is_instance_of_class(instance_b, class_c));
}
