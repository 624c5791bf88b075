//! Cooperative fiber scheduling.
//!
//! Grounded in chalk-engine's `Stack`/`Strand` suspend-resume machinery
//! (`chalk-engine/src/logic.rs`): a `Strand` there captures exactly enough
//! state to resume a suspended proof search later, linked to the table that
//! will receive its answer. `ObjFiber` plays the same role for suspended
//! Buzz call stacks, linked to the parent fiber that will receive its
//! `yield`ed or returned value.

use tracing::debug;

use buzz_ir::object::{FiberStatus, ObjHeader, ObjKind};
use buzz_ir::value::{ObjRef, Value};

use crate::frame::{CallFrame, CallFrameStack, OpenUpvalues, ValueStack};

/// A fiber: an independent call stack that can be suspended mid-execution
/// and resumed later from the exact point it yielded.
pub struct ObjFiber {
    pub header: ObjHeader,
    /// The fiber that resumed this one, if any. The root fiber (the script
    /// entry point) has no parent.
    pub parent: Option<ObjRef>,
    pub stack: ValueStack,
    pub frames: CallFrameStack,
    pub open_upvalues: OpenUpvalues,
    pub status: std::cell::Cell<FiberStatus>,
    /// The entry closure this fiber was (or will be) started with.
    pub entry: ObjRef,
    /// Set by `yield`, consumed by the next `resume` on the parent side;
    /// also the slot a completed fiber's return value is read from.
    pub result: std::cell::Cell<Value>,
}

impl ObjFiber {
    pub fn new(header: ObjHeader, entry: ObjRef) -> Self {
        ObjFiber {
            header,
            parent: None,
            stack: ValueStack::new(),
            frames: CallFrameStack::new(),
            open_upvalues: OpenUpvalues::new(),
            status: std::cell::Cell::new(FiberStatus::Instanciated),
            entry,
            result: std::cell::Cell::new(Value::Null),
        }
    }

    pub fn trace_roots(&self, out: &mut Vec<ObjRef>) {
        out.push(self.entry);
        if let Some(p) = self.parent {
            out.push(p);
        }
        for v in self.stack.iter() {
            if let Value::Obj(o) = v {
                out.push(*o);
            }
        }
        for frame in self.frames.iter() {
            out.push(frame.closure);
        }
        if let Value::Obj(o) = self.result.get() {
            out.push(o);
        }
    }
}

/// Thrown by scheduler operations that violate the fiber state machine's
/// preconditions.
#[derive(thiserror::Error, Debug)]
pub enum FiberError {
    #[error("cannot resume a fiber that has already finished")]
    ResumeOverFiber,
    #[error("yield is only legal inside a generator fiber")]
    YieldOutsideGenerator,
    #[error("yield is not legal from the root fiber")]
    YieldFromRoot,
}

/// `resume(f, args)`. `caller` becomes `f`'s parent.
///
/// Returns the frame the interpreter should now execute in: either `f`'s
/// very first frame (fresh start) or its previously-saved top frame
/// (resuming from a yield).
pub fn resume(f: ObjRef, caller: ObjRef, args: &[Value]) -> Result<(), FiberError> {
    let fiber: &ObjFiber = unsafe { crate::heap::view(f) };
    debug!(?f, ?caller, status = ?fiber.status.get(), "resuming fiber");
    match fiber.status.get() {
        FiberStatus::Over => return Err(FiberError::ResumeOverFiber),
        FiberStatus::Instanciated => {
            // SAFETY: exclusive access to a freshly-instantiated fiber that
            // no other code can reach yet.
            let fiber_mut = unsafe { &mut *(f.as_ptr().as_ptr() as *mut ObjFiber) };
            fiber_mut.parent = Some(caller);
            for &a in args {
                fiber_mut.stack.push(a);
            }
            fiber_mut.frames.push(CallFrame::new(fiber.entry, 0));
            fiber.status.set(FiberStatus::Running);
        }
        FiberStatus::Yielded => {
            let fiber_mut = unsafe { &mut *(f.as_ptr().as_ptr() as *mut ObjFiber) };
            fiber_mut.parent = Some(caller);
            if let Some(v) = args.first() {
                fiber_mut.stack.push(*v);
            }
            fiber.status.set(FiberStatus::Running);
        }
        FiberStatus::Running => {
            // Re-entrant resume of a fiber already on the call chain: the
            // interpreter loop is the only caller of `resume`, so this is
            // a host/bytecode bug rather than a runtime condition to model.
        }
    }
    Ok(())
}

/// `yield(v)`. `entry_is_generator` reflects whether the
/// fiber's entry closure's function has a non-void `yield_type`.
pub fn do_yield(
    f: ObjRef,
    value: Value,
    entry_is_generator: bool,
) -> Result<ObjRef, FiberError> {
    if !entry_is_generator {
        return Err(FiberError::YieldOutsideGenerator);
    }
    let fiber: &ObjFiber = unsafe { crate::heap::view(f) };
    let parent = fiber.parent.ok_or(FiberError::YieldFromRoot)?;
    debug!(?f, ?parent, "fiber yielding to parent");
    fiber.result.set(value);
    fiber.status.set(FiberStatus::Yielded);
    let parent_fiber: &ObjFiber = unsafe { crate::heap::view(parent) };
    parent_fiber.result.set(value);
    Ok(parent)
}

/// `over()` member.
pub fn is_over(f: ObjRef) -> bool {
    let fiber: &ObjFiber = unsafe { crate::heap::view(f) };
    fiber.status.get() == FiberStatus::Over
}

/// `cancel()` member: pending frames are discarded lazily,
/// at the next resume attempt, by virtue of `status` already reading
/// `Over` and `resume` refusing to proceed.
pub fn cancel(f: ObjRef) {
    debug!(?f, "cancelling fiber");
    let fiber: &ObjFiber = unsafe { crate::heap::view(f) };
    fiber.status.set(FiberStatus::Over);
}

/// Marks a fiber `Over` and records its final return value, called by the
/// interpreter when a fiber's root frame returns normally.
pub fn finish(f: ObjRef, return_value: Value) {
    let fiber: &ObjFiber = unsafe { crate::heap::view(f) };
    fiber.result.set(return_value);
    fiber.status.set(FiberStatus::Over);
}

pub const KIND: ObjKind = ObjKind::Fiber;
