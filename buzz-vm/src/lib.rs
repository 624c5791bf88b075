//! The GC heap, fiber scheduler and bytecode interpreter contract for Buzz.
//!
//! Sits above `buzz-ir` (data-only) the way `chalk-engine` sits above
//! `chalk-ir`: this crate gives the value/object model a lifecycle and an
//! execution model, but still knows nothing about surface syntax or type
//! resolution (that is `buzz-solve`'s job).

pub mod dispatch;
pub mod error;
pub mod fiber;
pub mod frame;
pub mod gc;
pub mod heap;
pub mod interpreter;
pub mod natives;
pub mod roots;

pub use error::RuntimeError;
pub use fiber::{FiberError, ObjFiber};
pub use gc::{GcConfig, GcStats, Heap};
pub use interpreter::{Interpreter, OpCode, Step};
