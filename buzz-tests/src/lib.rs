//! Shared scaffolding for the integration tests under `tests/`.
//!
//! No parser or bytecode emitter exists in this workspace, so these tests
//! drive the runtime crates directly at the API level rather than through
//! source text, the way chalk-tests drives `chalk-solve` directly through
//! lowered goals rather than through `rustc`.

use buzz_ir::intern;
use buzz_ir::object::{NativeContext, ObjClosure, ObjFunction, ObjHeader, ObjKind, ObjList};
use buzz_ir::placeholder::TypeDefRef;
use buzz_ir::types::{TypeDef, TypeKind};
use buzz_ir::value::{ObjRef, Value};
use buzz_vm::gc::{GcConfig, Heap};
use buzz_vm::{fiber, fiber::ObjFiber, Interpreter, OpCode, Step};

pub fn new_interpreter() -> Interpreter {
    Interpreter::new(Heap::new(GcConfig::default()))
}

/// Allocates a zero-arity, zero-upvalue closure suitable as a fiber entry
/// point. `yield_type` controls whether `do_yield` will treat it as a
/// generator.
pub fn alloc_entry_closure(interp: &mut Interpreter, yield_type: Option<TypeDefRef>) -> ObjRef {
    let def = TypeDefRef::new(TypeDef::simple(TypeKind::Function));
    let function = interp
        .alloc(ObjFunction {
            header: ObjHeader::new(ObjKind::Function),
            name: intern::intern("entry"),
            arity: 0,
            def,
            yield_type,
            upvalue_count: 0,
        })
        .expect("test heap has no max_heap_bytes cap");
    interp
        .alloc(ObjClosure {
            header: ObjHeader::new(ObjKind::Closure),
            function,
            upvalues: Vec::new(),
        })
        .expect("test heap has no max_heap_bytes cap")
}

pub fn spawn_fiber(interp: &mut Interpreter, entry: ObjRef) -> ObjRef {
    interp
        .alloc(ObjFiber::new(ObjHeader::new(ObjKind::Fiber), entry))
        .expect("test heap has no max_heap_bytes cap")
}

/// A bare-bones `NativeContext` for driving `buzz_vm::natives` functions
/// directly in a test, standing in for `buzz-driver::host::HostCall`'s
/// fiber-stack bridge (no frontend exists here to produce a running fiber
/// to bridge to).
pub struct NativeHarness<'a> {
    pub interp: &'a mut Interpreter,
    pub args: Vec<Value>,
    pub pushed: Vec<Value>,
    pub raised: Option<Value>,
}

impl<'a> NativeHarness<'a> {
    pub fn new(interp: &'a mut Interpreter, args: Vec<Value>) -> Self {
        NativeHarness {
            interp,
            args,
            pushed: Vec::new(),
            raised: None,
        }
    }
}

impl NativeContext for NativeHarness<'_> {
    fn push(&mut self, value: Value) {
        self.pushed.push(value);
    }
    fn pop(&mut self) -> Value {
        self.pushed.pop().expect("nothing pushed")
    }
    fn arg(&self, index: usize) -> Value {
        self.args[index]
    }
    fn arg_count(&self) -> usize {
        self.args.len()
    }
    fn raise(&mut self, value: Value) {
        self.raised = Some(value);
    }
    fn intern_string(&mut self, s: &str) -> Value {
        Value::Obj(self.interp.intern_string(s))
    }
    fn alloc_list(&mut self, item_type: TypeDefRef, items: Vec<Value>) -> Value {
        Value::Obj(
            self.interp
                .alloc(ObjList {
                    header: ObjHeader::new(ObjKind::List),
                    item_type,
                    items,
                })
                .expect("test heap has no max_heap_bytes cap"),
        )
    }
    fn mark_dirty(&mut self, obj: ObjRef) {
        self.interp.heap.mark_dirty(obj);
    }
}

/// Resumes `fiber` on `interp` and drives it through `ops` one instruction
/// at a time, recording a one-line trace entry per step. Stops early on
/// `FiberDone`/`Thrown` the same way the real interpreter loop would.
///
/// Standing in for a bytecode emitter that doesn't exist in this workspace:
/// the scenario tests under `tests/` hand-assemble the `ops` a compiler
/// would otherwise produce.
pub fn run_scenario(interp: &mut Interpreter, fiber: ObjRef, ops: &[OpCode]) -> Vec<String> {
    interp.active_fiber = Some(fiber);
    fiber::resume(fiber, fiber, &[]).expect("a freshly spawned fiber always resumes");
    let mut trace = Vec::with_capacity(ops.len());
    for op in ops {
        match interp.step(op) {
            Step::Continue => trace.push(format!("{op:?}")),
            Step::FiberDone(v) => {
                trace.push(format!("done({v:?})"));
                break;
            }
            Step::Thrown(e) => {
                trace.push(format!("thrown({e})"));
                break;
            }
        }
    }
    trace
}

/// Diffs an observed trace against the one a scenario is expected to
/// produce, reporting the first step at which they diverge rather than
/// just the two whole vectors.
pub fn assert_snapshot(actual: &[String], expected: &[&str]) {
    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    let divergence = actual
        .iter()
        .map(String::as_str)
        .zip_longest(expected.iter().copied())
        .find_position(|pair| !pair.clone().both().map(|(a, e)| a == e).unwrap_or(false));
    if let Some((i, pair)) = divergence {
        panic!(
            "trace diverges at step {i}: {pair:?}\nfull actual:   {actual:?}\nfull expected: {expected:?}"
        );
    }
    let actual: Vec<&str> = actual.iter().map(String::as_str).collect();
    assert_eq!(actual, expected, "trace length differs");
}
