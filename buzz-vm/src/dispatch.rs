//! Heap-aware completion of `buzz_ir::dispatch::is`.
//!
//! `buzz-ir` fixes every case that needs only the bare `ObjKind` tag; every
//! case that needs to walk live heap state — `ObjectInstance` subtyping,
//! `UpValue` unwrapping, and the structural comparisons for `List`/`Map`/
//! `Function`/`Closure`/`Bound`/`Native` — is finished here, where
//! `heap::view` is available. This function, not `buzz_ir::dispatch::is`, is
//! the one every caller with a live `Value` should reach for.

use buzz_ir::object::{ObjBound, ObjClosure, ObjFunction, ObjKind, ObjList, ObjMap, ObjNative, UpValueState};
use buzz_ir::placeholder::TypeDefRef;
use buzz_ir::types::{TypeKind, TypeUnion};
use buzz_ir::value::{ObjRef, Value};

use crate::frame::ValueStack;
use crate::heap;

/// Runtime type test (`is`), for a value on `stack`'s owning fiber — needed
/// only to dereference an upvalue still in its `Open` state.
pub fn is(value: &Value, ty: &TypeDefRef, stack: &ValueStack) -> bool {
    let obj = match value {
        Value::Obj(o) => *o,
        _ => return buzz_ir::dispatch::is(value, ty),
    };
    match obj.kind() {
        ObjKind::ObjectInstance => {
            ty.kind == TypeKind::Object
                && match &ty.payload {
                    // A bare `Object` type matches any instance; a `Class`
                    // payload names one specific class to walk the
                    // super-chain toward.
                    Some(TypeUnion::Class(target_class)) => {
                        is_instance_of_class(obj, *target_class)
                    }
                    _ => true,
                }
        }
        ObjKind::UpValue => is(&unwrap_upvalue(obj, stack), ty, stack),
        ObjKind::List => {
            ty.kind == TypeKind::List
                && match &ty.payload {
                    Some(TypeUnion::List { item }) => {
                        let l: &ObjList = unsafe { heap::view(obj) };
                        l.item_type.structurally_eql(item)
                    }
                    _ => true,
                }
        }
        ObjKind::Map => {
            ty.kind == TypeKind::Map
                && match &ty.payload {
                    Some(TypeUnion::Map { key, value }) => {
                        let m: &ObjMap = unsafe { heap::view(obj) };
                        m.key_type.structurally_eql(key) && m.value_type.structurally_eql(value)
                    }
                    _ => true,
                }
        }
        ObjKind::Function | ObjKind::Closure | ObjKind::Bound | ObjKind::Native => {
            ty.kind == TypeKind::Function
                && match &ty.payload {
                    Some(TypeUnion::Function(_)) => function_def(obj).structurally_eql(ty),
                    _ => true,
                }
        }
        _ => buzz_ir::dispatch::is(value, ty),
    }
}

/// Tests whether `instance` is-a `target_class` by walking the super
/// chain.
pub fn is_instance_of_class(instance: ObjRef, target_class: ObjRef) -> bool {
    heap::is_instance_of(instance, target_class)
}

/// The declared `TypeDef` a callable object was built with — `Closure` and
/// `Bound` chase down to the `Function`/`Native` they ultimately wrap.
fn function_def(obj: ObjRef) -> TypeDefRef {
    match obj.kind() {
        ObjKind::Function => {
            let f: &ObjFunction = unsafe { heap::view(obj) };
            f.def.clone()
        }
        ObjKind::Closure => {
            let c: &ObjClosure = unsafe { heap::view(obj) };
            function_def(c.function)
        }
        ObjKind::Bound => {
            let b: &ObjBound = unsafe { heap::view(obj) };
            function_def(b.callee)
        }
        ObjKind::Native => {
            let n: &ObjNative = unsafe { heap::view(obj) };
            n.def.clone()
        }
        other => unreachable!("function_def called on non-callable kind {other:?}"),
    }
}

fn unwrap_upvalue(obj: ObjRef, stack: &ValueStack) -> Value {
    let up: &buzz_ir::object::ObjUpValue = unsafe { heap::view(obj) };
    match up.state.get() {
        UpValueState::Open { stack_slot } => stack.get(stack_slot),
        UpValueState::Closed { value } => value,
    }
}
