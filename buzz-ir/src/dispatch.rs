//! Kind-discriminated `is`/`eql` dispatch over heap objects.
//!
//! One `match` on `ObjKind` per operation, per the design note preferring
//! static dispatch on the tag over a virtual method table.

use crate::object::ObjKind;
use crate::placeholder::TypeDefRef;
use crate::types::{TypeDef, TypeKind};
use crate::value::{ObjRef, Value};

/// Runtime type test (`is`).
pub fn is(value: &Value, ty: &TypeDefRef) -> bool {
    let obj = match value {
        Value::Null => return ty.optional,
        Value::Boolean(_) => return ty.kind == TypeKind::Bool,
        Value::Integer(_) | Value::Float(_) => return ty.kind == TypeKind::Number,
        Value::Obj(o) => *o,
    };
    is_obj(obj, ty)
}

/// The heap-independent half of `is`: kinds whose type test never needs to
/// look past the bare `ObjKind` tag.
///
/// `ObjectInstance` (needs the super-chain walk) and `UpValue` (needs to
/// dereference an open slot on the live stack) cannot be decided from a tag
/// alone; `buzz_vm::dispatch::is` intercepts both before ever reaching this
/// function, so their arms here are unreachable in practice and return the
/// conservative `false` rather than a value this crate cannot justify.
/// `List`/`Map`/`Function`/`Closure`/`Bound`/`Native` are intercepted the
/// same way for their structural comparisons; the arms below only run if
/// some future caller reaches this function directly with a bare `Value`.
fn is_obj(obj: ObjRef, ty: &TypeDefRef) -> bool {
    match obj.kind() {
        ObjKind::String => ty.kind == TypeKind::String,
        ObjKind::Pattern => ty.kind == TypeKind::Pattern,
        ObjKind::Fiber => ty.kind == TypeKind::Fiber,
        ObjKind::Type | ObjKind::Object | ObjKind::Enum => ty.kind == TypeKind::Type,
        ObjKind::ObjectInstance => false,
        ObjKind::EnumInstance => ty.kind == TypeKind::Enum,
        ObjKind::Function | ObjKind::Closure | ObjKind::Bound | ObjKind::Native => {
            ty.kind == TypeKind::Function && ty.payload.is_none()
        }
        ObjKind::List => ty.kind == TypeKind::List && ty.payload.is_none(),
        ObjKind::Map => ty.kind == TypeKind::Map && ty.payload.is_none(),
        ObjKind::UpValue => false,
        ObjKind::UserData => ty.kind == TypeKind::UserData,
    }
}

/// Value equality (`eql`).
///
/// Strings compare by identity (sound because they are interned); all
/// other object kinds either have a bespoke rule or fall back to pointer
/// identity.
pub fn eql(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Obj(x), Value::Obj(y)) => eql_obj(*x, *y),
        _ => false,
    }
}

fn eql_obj(a: ObjRef, b: ObjRef) -> bool {
    if a.kind() != b.kind() {
        return false;
    }
    match a.kind() {
        ObjKind::String | ObjKind::Pattern => a.as_ptr() == b.as_ptr(),
        ObjKind::Type => true, // delegated to TypeDef::eql by the caller, which holds the defs
        _ => a.as_ptr() == b.as_ptr(),
    }
}

pub fn type_eql(a: &TypeDef, b: &TypeDef) -> bool {
    a.eql(b)
}
