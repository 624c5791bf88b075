//! Runtime value/object model and static `TypeDef` vocabulary for Buzz.
//!
//! Analogous to chalk-ir: a closed set of data
//! types with no execution behavior of its own. `buzz-vm` supplies the
//! heap and scheduler that give these types a lifecycle; `buzz-solve`
//! supplies canonicalization and placeholder resolution.

pub mod dispatch;
pub mod intern;
pub mod object;
pub mod placeholder;
pub mod types;
pub mod value;

pub use object::NativeContext;
pub use placeholder::TypeDefRef;
pub use types::{TypeDef, TypeKind, TypeUnion};
pub use value::{HashableValue, ObjRef, Value};

#[derive(thiserror::Error, Debug)]
pub enum IrError {
    #[error("placeholder at {0:?} is self-referential")]
    SelfReferentialPlaceholder(placeholder::SourceLocation),
    #[error("placeholder declared at {0:?} was never resolved")]
    UnresolvedPlaceholder(placeholder::SourceLocation),
    /// A relation chain fed back into a placeholder already being resolved
    /// in the same `resolve` call. `link` itself builds a forest and can
    /// never produce this by construction; this guards the walk in
    /// `resolve` against a derived-type cycle reaching back to its own
    /// starting placeholder some other way.
    #[error("placeholder at {0:?} resolves back to itself through a relation cycle")]
    PlaceholderCycle(placeholder::SourceLocation),
}
