//! The polymorphic heap object and its header.
//!
//! Mirrors chalk-ir's approach to its `Ty`/`Goal` sums: one tagged enum per
//! concern, dispatched on the tag rather than through a vtable (design note:
//! "static dispatch on the tag is preferred for branch prediction"). Behavior
//! that needs heap access (marking, sweeping, scheduling) lives in
//! `buzz-vm`; this crate only fixes the data layout every kind shares.

use lalrpop_intern::InternedString;
use std::cell::Cell;

use crate::placeholder::TypeDefRef;
use crate::value::{ObjRef, Value};

/// Discriminant for every heap object kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjKind {
    String,
    Pattern,
    Type,
    UpValue,
    Closure,
    Function,
    Object,
    ObjectInstance,
    List,
    Map,
    Enum,
    EnumInstance,
    Bound,
    Native,
    UserData,
    Fiber,
}

/// Every heap object begins with this header.
pub struct ObjHeader {
    pub kind: ObjKind,
    /// Toggled by the tracer; cleared at the end of every mark phase.
    pub marked: Cell<bool>,
    /// Set by write barriers; consulted by the next young collection.
    pub dirty: Cell<bool>,
    /// Threads this object onto its current generation's intrusive list.
    pub gen_link: Cell<GenLink>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GenLink {
    Young,
    Old,
}

impl ObjHeader {
    pub fn new(kind: ObjKind) -> Self {
        ObjHeader {
            kind,
            marked: Cell::new(false),
            dirty: Cell::new(false),
            gen_link: Cell::new(GenLink::Young),
        }
    }
}

/// An interned, immutable string.
pub struct ObjString {
    pub header: ObjHeader,
    pub value: InternedString,
}

/// An opaque pattern handle.
pub struct ObjPattern {
    pub header: ObjHeader,
    pub source: InternedString,
}

/// Wraps a canonical `TypeDef` as a first-class runtime value (`type`
/// literals, `is`/`as` operands).
pub struct ObjType {
    pub header: ObjHeader,
    pub def: TypeDefRef,
}

#[derive(Copy, Clone)]
pub enum UpValueState {
    Open { stack_slot: usize },
    Closed { value: Value },
}

/// A closure's capture slot. Transitions open→closed are monotonic.
pub struct ObjUpValue {
    pub header: ObjHeader,
    pub state: Cell<UpValueState>,
}

impl ObjUpValue {
    pub fn is_open(&self) -> bool {
        matches!(self.state.get(), UpValueState::Open { .. })
    }

    /// Closes an open upvalue by copying out its captured value. Calling
    /// this on an already-closed upvalue is a logic error in the caller
    /// (closures only close their own upvalues once, at frame-pop).
    pub fn close(&self, value: Value) {
        debug_assert!(self.is_open(), "upvalue closed twice");
        self.state.set(UpValueState::Closed { value });
    }
}

pub struct ObjFunction {
    pub header: ObjHeader,
    pub name: InternedString,
    pub arity: u8,
    pub def: TypeDefRef,
    /// `Some` iff this function is a generator entered via the fiber
    /// opcode: function kind `Anonymous` with a non-void `yield_type`.
    pub yield_type: Option<TypeDefRef>,
    pub upvalue_count: u8,
}

pub struct ObjClosure {
    pub header: ObjHeader,
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

/// A class definition. Nominal: never structurally collapsed.
pub struct ObjObject {
    pub header: ObjHeader,
    pub name: InternedString,
    pub super_class: Option<ObjRef>,
    pub fields: Vec<(InternedString, TypeDefRef)>,
    pub methods: Vec<(InternedString, ObjRef)>,
    pub static_fields: Vec<(InternedString, Cell<Value>)>,
}

pub struct ObjObjectInstance {
    pub header: ObjHeader,
    /// Traced first by `mark` so the class can never be swept out from
    /// under a live instance.
    pub class: ObjRef,
    pub fields: Vec<(InternedString, Cell<Value>)>,
}

pub struct ObjList {
    pub header: ObjHeader,
    pub item_type: TypeDefRef,
    pub items: Vec<Value>,
}

pub struct ObjMap {
    pub header: ObjHeader,
    pub key_type: TypeDefRef,
    pub value_type: TypeDefRef,
    /// Insertion order is observable through `rawNext`, so entries are a
    /// plain ordered vector rather than a hash map.
    pub entries: Vec<(crate::value::HashableValue, Value)>,
}

pub struct ObjEnum {
    pub header: ObjHeader,
    pub name: InternedString,
    pub variant_type: TypeDefRef,
    pub cases: Vec<InternedString>,
}

pub struct ObjEnumInstance {
    pub header: ObjHeader,
    pub enum_ref: ObjRef,
    pub case_index: usize,
    pub value: Value,
}

/// A bound method: `(receiver, closure|native)`.
pub struct ObjBound {
    pub header: ObjHeader,
    pub receiver: Value,
    pub callee: ObjRef,
}

pub type NativeFn = fn(&mut dyn crate::NativeContext) -> i32;

/// A native function wrapper, lazily allocated by member materialization
///.
pub struct ObjNative {
    pub header: ObjHeader,
    pub name: InternedString,
    pub function: NativeFn,
    /// The signature `is`/`as` compares a bound native against, mirroring
    /// `ObjFunction::def`.
    pub def: TypeDefRef,
}

/// Host-owned opaque payload (files, sockets, …). Reclaimed by the GC,
/// never by an explicit finalizer chain.
pub struct ObjUserData {
    pub header: ObjHeader,
    pub tag: InternedString,
    pub payload: Box<dyn std::any::Any>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FiberStatus {
    Instanciated,
    Running,
    Yielded,
    Over,
}

/// The host library contract: a native function receives a
/// handle to push/pop values and raise exceptions on the active fiber, and
/// returns `{-1: error on stack, 0: no value pushed, N>0: N values pushed}`.
///
/// Built-in member natives are the same `NativeFn` shape as
/// host-library natives, but additionally need to allocate: `list.sub`
/// returns a new list, `string.encodeBase64` a new interned string. The
/// last two methods exist for exactly that; a pure host library is free to
/// ignore them.
pub trait NativeContext {
    fn push(&mut self, value: Value);
    fn pop(&mut self) -> Value;
    fn arg(&self, index: usize) -> Value;
    fn arg_count(&self) -> usize;
    fn raise(&mut self, value: Value);
    fn intern_string(&mut self, s: &str) -> Value;
    fn alloc_list(&mut self, item_type: TypeDefRef, items: Vec<Value>) -> Value;
    /// Write barrier: a native just stored a possibly-young value into a
    /// field of `obj` that the GC already tracks (`list.append`,
    /// `map.remove`'s surviving entries, and any future mutating method).
    /// Safe to call unconditionally; it is a no-op for a young `obj`.
    fn mark_dirty(&mut self, obj: ObjRef);
}

