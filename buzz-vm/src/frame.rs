//! Per-fiber execution state: the value stack and call-frame stack. Mirrors
//! chalk-engine's `Stack` of `StackEntry`s, but holds interpreter frames
//! instead of solver strands.

use smallvec::SmallVec;

use buzz_ir::object::ObjUpValue;
use buzz_ir::value::{ObjRef, Value};

/// One activation record: the running closure, its instruction pointer,
/// and where its locals begin on the shared stack.
#[derive(Copy, Clone, Debug)]
pub struct CallFrame {
    pub closure: ObjRef,
    pub ip: usize,
    pub stack_base: usize,
}

impl CallFrame {
    pub fn new(closure: ObjRef, stack_base: usize) -> Self {
        CallFrame {
            closure,
            ip: 0,
            stack_base,
        }
    }
}

/// A fiber's contiguous operand stack. Slots below a frame's `stack_base`
/// belong to its caller and are never touched by that frame.
#[derive(Default, Debug)]
pub struct ValueStack {
    slots: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        ValueStack { slots: Vec::new() }
    }

    pub fn push(&mut self, v: Value) {
        self.slots.push(v);
    }

    pub fn pop(&mut self) -> Value {
        self.slots.pop().expect("value stack underflow")
    }

    pub fn get(&self, slot: usize) -> Value {
        self.slots[slot]
    }

    pub fn set(&mut self, slot: usize, v: Value) {
        self.slots[slot] = v;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.slots.iter()
    }
}

/// A fiber's call frames, innermost last. Most Buzz call chains stay
/// within a handful of frames, so the first 8 live inline; only a deeper
/// chain spills to the heap.
#[derive(Default, Debug)]
pub struct CallFrameStack {
    frames: SmallVec<[CallFrame; 8]>,
}

impl CallFrameStack {
    pub fn new() -> Self {
        CallFrameStack {
            frames: SmallVec::new(),
        }
    }

    pub fn push(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut CallFrame> {
        self.frames.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallFrame> {
        self.frames.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Open upvalues, kept sorted by the stack slot they capture, so closing
/// everything at or above a popped frame's base is a binary search plus a
/// drain rather than a full scan.
#[derive(Default, Debug)]
pub struct OpenUpvalues {
    // (stack_slot, upvalue), ascending by stack_slot.
    entries: Vec<(usize, ObjRef)>,
}

impl OpenUpvalues {
    pub fn new() -> Self {
        OpenUpvalues {
            entries: Vec::new(),
        }
    }

    /// Finds an already-open upvalue for `slot`, or inserts `make()`'s
    /// result at the sorted position, so upvalues are shared when multiple
    /// closures capture the same local.
    pub fn get_or_insert(&mut self, slot: usize, make: impl FnOnce() -> ObjRef) -> ObjRef {
        match self.entries.binary_search_by_key(&slot, |(s, _)| *s) {
            Ok(i) => self.entries[i].1,
            Err(i) => {
                let obj = make();
                self.entries.insert(i, (slot, obj));
                obj
            }
        }
    }

    /// Closes and removes every upvalue capturing a slot `>= from_slot`,
    /// calling `value_of` to read the live stack value before closing.
    pub fn close_from(&mut self, from_slot: usize, value_of: impl Fn(usize) -> Value) {
        let split = self
            .entries
            .binary_search_by_key(&from_slot, |(s, _)| *s)
            .unwrap_or_else(|i| i);
        for (slot, obj) in self.entries.drain(split..) {
            let up: &ObjUpValue = unsafe { crate::heap::view(obj) };
            up.close(value_of(slot));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzz_ir::object::{ObjHeader, ObjKind, UpValueState};
    use itertools::Itertools;
    use std::cell::Cell;

    fn fake_upvalue(slot: usize) -> ObjRef {
        let boxed = Box::new(ObjUpValue {
            header: ObjHeader::new(ObjKind::UpValue),
            state: Cell::new(UpValueState::Open { stack_slot: slot }),
        });
        unsafe { ObjRef::from_raw(std::ptr::NonNull::new_unchecked(Box::into_raw(boxed)).cast()) }
    }

    #[test]
    fn out_of_order_inserts_stay_sorted_by_slot() {
        let mut upvalues = OpenUpvalues::new();
        for slot in [5, 1, 3] {
            upvalues.get_or_insert(slot, || fake_upvalue(slot));
        }
        assert!(upvalues.entries.iter().map(|(s, _)| *s).tuple_windows().all(|(a, b)| a < b));
    }

    #[test]
    fn get_or_insert_reuses_an_existing_slot() {
        let mut upvalues = OpenUpvalues::new();
        let first = upvalues.get_or_insert(2, || fake_upvalue(2));
        let second = upvalues.get_or_insert(2, || panic!("should not allocate twice"));
        assert_eq!(first.as_ptr(), second.as_ptr());
    }
}
