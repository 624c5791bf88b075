//! Unsafe plumbing shared by allocation, marking and sweep: every heap
//! struct begins with `ObjHeader` (`#[repr(C)]`), so a `NonNull<ObjHeader>`
//! can be reinterpreted back into its concrete type once the tag is known.
//! This is the "tagged sum dispatched on a tag" design note made concrete
//! for a GC'd heap rather than an in-memory enum.

use std::ptr::NonNull;

use buzz_ir::object::{
    FiberStatus, ObjBound, ObjClosure, ObjEnum, ObjEnumInstance, ObjFunction, ObjHeader, ObjKind,
    ObjList, ObjMap, ObjNative, ObjObject, ObjObjectInstance, ObjPattern, ObjString, ObjType,
    ObjUpValue, ObjUserData, UpValueState,
};
use buzz_ir::value::{ObjRef, Value};

use crate::fiber::ObjFiber;

/// # Safety
/// `ptr` must actually point at a `T` whose first field is `ObjHeader`.
pub unsafe fn cast<T>(ptr: NonNull<ObjHeader>) -> NonNull<T> {
    ptr.cast()
}

/// # Safety
/// Caller must know `obj` was allocated as a `T` via [`alloc`].
pub unsafe fn view<'a, T>(obj: ObjRef) -> &'a T {
    cast::<T>(obj.as_ptr()).as_ref()
}

/// # Safety
/// Same obligations as [`view`], plus: the single-threaded cooperative
/// model means the caller must be the only live borrow of
/// this object for the duration of the returned reference.
pub unsafe fn view_mut<'a, T>(obj: ObjRef) -> &'a mut T {
    let mut ptr = cast::<T>(obj.as_ptr());
    ptr.as_mut()
}

/// Reconstructs the `Box<T>` that [`crate::gc::Heap::allocate`] leaked, for
/// use by sweep. Consumes the object.
///
/// # Safety
/// Must only be called once per object, during sweep, after confirming the
/// object is unmarked.
pub unsafe fn take<T>(obj: ObjRef) -> Box<T> {
    Box::from_raw(cast::<T>(obj.as_ptr()).as_ptr())
}

/// Enumerates the objects directly referenced by `obj`: marking recurses
/// via its per-kind `mark` method which enumerates referents.
pub fn referents(obj: ObjRef, out: &mut Vec<ObjRef>) {
    match obj.kind() {
        ObjKind::String | ObjKind::Pattern | ObjKind::Native | ObjKind::UserData => {}
        ObjKind::Type => {
            // TypeDefs reference further TypeDefs only through `TypeDefRef`
            // (`Arc`-owned, not GC-owned), so there is nothing further to
            // trace from the heap's point of view.
        }
        ObjKind::UpValue => {
            let up: &ObjUpValue = unsafe { view(obj) };
            if let UpValueState::Closed { value } = up.state.get() {
                push_value(&value, out);
            }
        }
        ObjKind::Closure => {
            let c: &ObjClosure = unsafe { view(obj) };
            out.push(c.function);
            out.extend(c.upvalues.iter().copied());
        }
        ObjKind::Function => {}
        ObjKind::Object => {
            let o: &ObjObject = unsafe { view(obj) };
            if let Some(s) = o.super_class {
                out.push(s);
            }
            out.extend(o.methods.iter().map(|(_, m)| *m));
            for (_, cell) in &o.static_fields {
                push_value(&cell.get(), out);
            }
        }
        ObjKind::ObjectInstance => {
            let i: &ObjObjectInstance = unsafe { view(obj) };
            // The class is traced first: sweeping it while an instance is
            // reachable would leave a dangling class pointer.
            out.push(i.class);
            for (_, cell) in &i.fields {
                push_value(&cell.get(), out);
            }
        }
        ObjKind::List => {
            let l: &ObjList = unsafe { view(obj) };
            for v in &l.items {
                push_value(v, out);
            }
        }
        ObjKind::Map => {
            let m: &ObjMap = unsafe { view(obj) };
            for (k, v) in &m.entries {
                if let buzz_ir::value::HashableValue::Obj(o) = k {
                    out.push(*o);
                }
                push_value(v, out);
            }
        }
        ObjKind::Enum => {
            let e: &ObjEnum = unsafe { view(obj) };
            let _ = e; // cases/variant_type carry no further heap refs
        }
        ObjKind::EnumInstance => {
            let e: &ObjEnumInstance = unsafe { view(obj) };
            out.push(e.enum_ref);
            push_value(&e.value, out);
        }
        ObjKind::Bound => {
            let b: &ObjBound = unsafe { view(obj) };
            push_value(&b.receiver, out);
            out.push(b.callee);
        }
        ObjKind::Fiber => {
            let f: &ObjFiber = unsafe { view(obj) };
            f.trace_roots(out);
        }
    }
}

fn push_value(v: &Value, out: &mut Vec<ObjRef>) {
    if let Value::Obj(o) = v {
        out.push(*o);
    }
}

/// Drops the concrete payload behind `obj`. Unmarked objects have their
/// per-kind `deinit` invoked and are freed during sweep.
///
/// # Safety
/// `obj` must be unmarked and must not be referenced again afterwards.
pub unsafe fn deinit(obj: ObjRef) {
    match obj.kind() {
        ObjKind::String => drop(take::<ObjString>(obj)),
        ObjKind::Pattern => drop(take::<ObjPattern>(obj)),
        ObjKind::Type => drop(take::<ObjType>(obj)),
        ObjKind::UpValue => drop(take::<ObjUpValue>(obj)),
        ObjKind::Closure => drop(take::<ObjClosure>(obj)),
        ObjKind::Function => drop(take::<ObjFunction>(obj)),
        ObjKind::Object => drop(take::<ObjObject>(obj)),
        ObjKind::ObjectInstance => drop(take::<ObjObjectInstance>(obj)),
        ObjKind::List => drop(take::<ObjList>(obj)),
        ObjKind::Map => drop(take::<ObjMap>(obj)),
        ObjKind::Enum => drop(take::<ObjEnum>(obj)),
        ObjKind::EnumInstance => drop(take::<ObjEnumInstance>(obj)),
        ObjKind::Bound => drop(take::<ObjBound>(obj)),
        ObjKind::Native => drop(take::<ObjNative>(obj)),
        ObjKind::UserData => drop(take::<ObjUserData>(obj)),
        ObjKind::Fiber => drop(take::<ObjFiber>(obj)),
    }
}

/// Implements the heap-aware half of `buzz_ir::dispatch::is` for
/// `ObjectInstance` (subclass walk) and `UpValue` (open/closed unwrap).
pub fn is_instance_of(instance: ObjRef, target_class: ObjRef) -> bool {
    let inst: &ObjObjectInstance = unsafe { view(instance) };
    let mut class_ref = Some(inst.class);
    while let Some(c) = class_ref {
        if c.as_ptr() == target_class.as_ptr() {
            return true;
        }
        let class: &ObjObject = unsafe { view(c) };
        class_ref = class.super_class;
    }
    false
}

pub fn fiber_status(obj: ObjRef) -> FiberStatus {
    let f: &ObjFiber = unsafe { view(obj) };
    f.status.get()
}

/// The byte size of the concrete struct behind `kind`, for the heap's live-
/// bytes accounting during sweep (sweep only has the tag, never the
/// original `T` a `Box<T>` was allocated as).
pub fn size_of_kind(kind: ObjKind) -> usize {
    use std::mem::size_of;
    match kind {
        ObjKind::String => size_of::<ObjString>(),
        ObjKind::Pattern => size_of::<ObjPattern>(),
        ObjKind::Type => size_of::<ObjType>(),
        ObjKind::UpValue => size_of::<ObjUpValue>(),
        ObjKind::Closure => size_of::<ObjClosure>(),
        ObjKind::Function => size_of::<ObjFunction>(),
        ObjKind::Object => size_of::<ObjObject>(),
        ObjKind::ObjectInstance => size_of::<ObjObjectInstance>(),
        ObjKind::List => size_of::<ObjList>(),
        ObjKind::Map => size_of::<ObjMap>(),
        ObjKind::Enum => size_of::<ObjEnum>(),
        ObjKind::EnumInstance => size_of::<ObjEnumInstance>(),
        ObjKind::Bound => size_of::<ObjBound>(),
        ObjKind::Native => size_of::<ObjNative>(),
        ObjKind::UserData => size_of::<ObjUserData>(),
        ObjKind::Fiber => size_of::<ObjFiber>(),
    }
}
