//! Type canonicalization, placeholder resolution and native member tables.
//!
//! The layer chalk-solve plays above chalk-ir/chalk-engine: where
//! `buzz-ir` fixes data shapes and `buzz-vm` gives them a heap and a
//! scheduler, this crate is where forward references actually get nailed
//! down to concrete types before the interpreter ever runs.

pub mod error;
pub mod members;
pub mod registry;
pub mod resolve;

pub use error::CompileError;
pub use members::{MemberDef, MemberTable};
pub use registry::TypeRegistry;
pub use resolve::PlaceholderTable;
