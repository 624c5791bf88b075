//! Deferred type resolution for forward references during single-pass
//! parsing.
//!
//! Design note: "model as a flat table with `(node_id, parent_id,
//! relation)` tuples; `link` is enforced idempotent at the table." This
//! module owns the node type and linking rule; `buzz-solve::resolve` owns
//! the table and the substitution walk.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::types::TypeDef;

/// A canonical, possibly-shared `TypeDef` handle. Canonicalization itself
/// (hash-consing structural types, keeping Object/Enum nominal) lives in
/// `buzz-solve::registry`; this crate only fixes the handle's shape so that
/// `eql`/`Arc::ptr_eq` compose so that structural equality and identity
/// agree wherever hash-consing guarantees a single canonical instance.
#[derive(Clone, Debug)]
pub struct TypeDefRef(pub Arc<TypeDef>);

impl TypeDefRef {
    pub fn new(def: TypeDef) -> Self {
        TypeDefRef(Arc::new(def))
    }

    pub fn eql(&self, other: &TypeDefRef) -> bool {
        self.0.eql(&other.0)
    }

    pub fn same_object(&self, other: &TypeDefRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for TypeDefRef {
    fn eq(&self, other: &Self) -> bool {
        self.eql(other)
    }
}

impl std::ops::Deref for TypeDefRef {
    type Target = TypeDef;
    fn deref(&self) -> &TypeDef {
        &self.0
    }
}

/// A source position, opaque outside the parser.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_id: u32,
    pub line: u32,
    pub column: u32,
}

/// Syntactic use that produced an edge from a placeholder to one of its
/// children.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Call,
    Yield,
    Subscript,
    Key,
    SuperFieldAccess,
    FieldAccess,
    Assignment,
    Instance,
    Optional,
    Unwrap,
}

pub type PlaceholderId = u32;

/// The deferred, partially-known descriptor a placeholder `TypeDef` wraps
///. `parent`/`children` are populated by `link`; resolution
/// lives in `buzz-solve::resolve::resolve_placeholder`.
#[derive(Clone, Debug)]
pub struct PlaceholderDef {
    pub id: PlaceholderId,
    pub name: Option<lalrpop_intern::InternedString>,
    pub location: SourceLocation,
    pub parent: Option<PlaceholderId>,
    pub parent_relation: Option<Relation>,
    /// Most placeholders are referenced from only a couple of call sites;
    /// `SmallVec` keeps that common case off the heap.
    pub children: SmallVec<[PlaceholderId; 4]>,
}

impl PlaceholderDef {
    pub fn new(id: PlaceholderId, name: Option<lalrpop_intern::InternedString>, location: SourceLocation) -> Self {
        tracing::trace!(id, ?location, "new placeholder");
        PlaceholderDef {
            id,
            name,
            location,
            parent: None,
            parent_relation: None,
            children: SmallVec::new(),
        }
    }
}
