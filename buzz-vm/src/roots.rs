//! The GC root set: "the active fiber chain's value
//! stacks, call frames' closures, and any globals table."
//!
//! Kept as a trait so `gc::Heap` never has to know about `Interpreter`
//! directly — the same layering chalk-engine uses between its `Forest`
//! and the `Context` trait it is generic over.

use buzz_ir::value::ObjRef;

pub trait RootSource {
    fn trace_roots(&self, out: &mut Vec<ObjRef>);
}

/// A fixed root set, useful for tests and for tracing a single fiber in
/// isolation without a full interpreter.
pub struct RootSet(pub Vec<ObjRef>);

impl RootSource for RootSet {
    fn trace_roots(&self, out: &mut Vec<ObjRef>) {
        out.extend_from_slice(&self.0);
    }
}
