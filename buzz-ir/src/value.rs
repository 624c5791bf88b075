//! The tagged value union that Buzz's stack and fields carry.

use std::ptr::NonNull;

use crate::object::{ObjHeader, ObjKind};

/// A GC-owned reference to a heap object.
///
/// Mirrors chalk-ir's raw, arena-owned references rather than
/// reference-counted cycles — the GC in `buzz-vm` is the only memory
/// authority, so this wrapper carries no destructor and no refcount.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjRef(NonNull<ObjHeader>);

impl ObjRef {
    /// # Safety
    /// `ptr` must point at a live `ObjHeader` owned by a `buzz-vm` heap.
    pub unsafe fn from_raw(ptr: NonNull<ObjHeader>) -> Self {
        ObjRef(ptr)
    }

    pub fn as_ptr(self) -> NonNull<ObjHeader> {
        self.0
    }

    pub fn header(self) -> &'static ObjHeader {
        // SAFETY: the pointer is guaranteed live by the GC contract for as
        // long as any Value referencing it is reachable from a traced root.
        unsafe { self.0.as_ref() }
    }

    pub fn kind(self) -> ObjKind {
        self.header().kind
    }
}

impl std::fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjRef({:?}, {:?})", self.0, self.kind())
    }
}

#[derive(Copy, Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Obj(ObjRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(o) => Some(*o),
            _ => None,
        }
    }

    /// Projects a `Value` into the `HashableValue` subset used as map keys
    ///: excludes NaN floats and mutable object variants.
    pub fn as_hashable(self) -> Option<HashableValue> {
        match self {
            Value::Null => Some(HashableValue::Null),
            Value::Boolean(b) => Some(HashableValue::Boolean(b)),
            Value::Integer(i) => Some(HashableValue::Integer(i)),
            Value::Float(f) if !f.is_nan() => Some(HashableValue::Float(f.to_bits())),
            Value::Float(_) => None,
            Value::Obj(o) => match o.kind() {
                ObjKind::String | ObjKind::Pattern | ObjKind::Type | ObjKind::Enum => {
                    Some(HashableValue::Obj(o))
                }
                _ => None,
            },
        }
    }
}

/// The hashable projection of `Value`: strings hash by
/// identity (they are interned), numbers by bit pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashableValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(u64),
    Obj(ObjRef),
}
