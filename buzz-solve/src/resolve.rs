//! The placeholder graph and its substitution walk.
//!
//! Grounded in chalk-engine's `Table`/answer-substitution machinery: a
//! `Placeholder`'s children are strands waiting on a parent answer, and
//! `resolve_placeholder` plays the role of `Answer::subst` propagating a
//! concrete binding out to every dependent.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use buzz_ir::placeholder::{PlaceholderDef, PlaceholderId, Relation, SourceLocation, TypeDefRef};
use buzz_ir::types::{TypeDef, TypeKind, TypeUnion};
use buzz_ir::IrError;

/// The mutable source of truth for placeholder linkage (design note: "model
/// as a flat table with `(node_id, parent_id, relation)` tuples").
/// `TypeDefRef`s tagged `Placeholder` only carry an id into this table; the
/// table itself is owned by the compilation session, not by any one
/// `TypeDefRef`.
#[derive(Default)]
pub struct PlaceholderTable {
    nodes: FxHashMap<PlaceholderId, PlaceholderDef>,
    resolved: FxHashMap<PlaceholderId, TypeDefRef>,
}

impl PlaceholderTable {
    pub fn new() -> Self {
        PlaceholderTable::default()
    }

    pub fn register(&mut self, id: PlaceholderId, name: Option<lalrpop_intern::InternedString>, location: SourceLocation) {
        self.nodes
            .entry(id)
            .or_insert_with(|| PlaceholderDef::new(id, name, location));
    }

    /// `link(parent, child, rel)`. No-op on self-link or if
    /// `child` already has a parent (first edge wins).
    pub fn link(&mut self, parent: PlaceholderId, child: PlaceholderId, rel: Relation) {
        if parent == child {
            return;
        }
        let already_linked = self
            .nodes
            .get(&child)
            .map(|c| c.parent.is_some())
            .unwrap_or(false);
        if already_linked {
            return;
        }
        debug!(parent, child, ?rel, "linking placeholder");
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
            child_node.parent_relation = Some(rel);
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
    }

    /// Binds `id` to `actual` and transitively re-evaluates every
    /// descendant's relation against it.
    ///
    /// `link`'s first-edge-wins rule keeps the parent pointers a forest, so
    /// a derived type can never walk back to an ancestor through `children`
    /// alone. The only way this loop could still spin forever is a caller
    /// resolving the same `id` again from inside its own derived-type
    /// chain (a cycle in the *value*, not the table); `visiting` catches
    /// that case and reports [`IrError::PlaceholderCycle`] instead of
    /// recursing without bound.
    pub fn resolve(&mut self, id: PlaceholderId, actual: TypeDefRef) -> Result<(), IrError> {
        let mut visiting = FxHashSet::default();
        self.resolve_inner(id, actual, &mut visiting)
    }

    fn resolve_inner(
        &mut self,
        id: PlaceholderId,
        actual: TypeDefRef,
        visiting: &mut FxHashSet<PlaceholderId>,
    ) -> Result<(), IrError> {
        if !visiting.insert(id) {
            let loc = self
                .nodes
                .get(&id)
                .map(|n| n.location)
                .unwrap_or(SourceLocation {
                    file_id: 0,
                    line: 0,
                    column: 0,
                });
            return Err(IrError::PlaceholderCycle(loc));
        }
        debug!(id, "resolving placeholder");
        self.resolved.insert(id, actual.clone());
        let children = self
            .nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            let rel = self
                .nodes
                .get(&child)
                .and_then(|n| n.parent_relation)
                .expect("linked child always carries its relation");
            if let Some(derived) = apply_relation(rel, &actual) {
                self.resolve_inner(child, derived, visiting)?;
            }
            // Relations this table cannot evaluate without heap access
            // (`FieldAccess`, `SuperFieldAccess`) are resolved by
            // `buzz-vm`'s class metadata once the class is materialized;
            // the placeholder is left open here rather than guessed at.
        }
        visiting.remove(&id);
        Ok(())
    }

    /// The effective type for `id`: its resolved binding if one exists, or
    /// the open placeholder itself.
    pub fn effective(&self, id: PlaceholderId, placeholder_ty: &TypeDefRef) -> TypeDefRef {
        self.resolved
            .get(&id)
            .cloned()
            .unwrap_or_else(|| placeholder_ty.clone())
    }

    pub fn is_resolved(&self, id: PlaceholderId) -> bool {
        self.resolved.contains_key(&id)
    }

    /// Every placeholder with no binding, paired with its source location.
    /// Ordered by id so that `finish`'s reported failure, and any
    /// diagnostic dump over the whole table, is stable across runs rather
    /// than following the hash map's arbitrary iteration order.
    pub fn unresolved(&self) -> Vec<(PlaceholderId, SourceLocation)> {
        use itertools::Itertools;
        self.nodes
            .values()
            .filter(|n| !self.resolved.contains_key(&n.id))
            .map(|n| (n.id, n.location))
            .sorted_by_key(|&(id, _)| id)
            .collect()
    }

    pub fn finish(&self) -> Result<(), IrError> {
        if let Some((_, loc)) = self.unresolved().first() {
            return Err(IrError::UnresolvedPlaceholder(*loc));
        }
        Ok(())
    }

    pub fn node(&self, id: PlaceholderId) -> Option<&PlaceholderDef> {
        self.nodes.get(&id)
    }
}

/// Re-evaluates a child's true type given the parent's now-known type,
/// for the relations expressible without heap access.
fn apply_relation(rel: Relation, parent_actual: &TypeDefRef) -> Option<TypeDefRef> {
    match rel {
        Relation::Call => match &parent_actual.payload {
            Some(TypeUnion::Function(sig)) => Some(sig.return_ty.clone()),
            _ => None,
        },
        Relation::Yield => match &parent_actual.payload {
            Some(TypeUnion::Function(sig)) => sig.yield_ty.clone(),
            Some(TypeUnion::Fiber { yield_ty, .. }) => Some(yield_ty.clone()),
            _ => None,
        },
        Relation::Subscript => match &parent_actual.payload {
            Some(TypeUnion::List { item }) => Some(item.clone()),
            Some(TypeUnion::Map { value, .. }) => Some(value.clone()),
            _ => None,
        },
        Relation::Key => match &parent_actual.payload {
            Some(TypeUnion::Map { key, .. }) => Some(key.clone()),
            _ => None,
        },
        Relation::Optional => Some(TypeDefRef::new(parent_actual.clone_optional())),
        Relation::Unwrap => Some(TypeDefRef::new(TypeDef {
            optional: false,
            kind: parent_actual.kind,
            payload: parent_actual.payload.clone(),
        })),
        Relation::Instance => {
            if parent_actual.kind == TypeKind::Object {
                Some(TypeDefRef::new(TypeDef {
                    optional: false,
                    kind: TypeKind::ObjectInstance,
                    payload: parent_actual.payload.clone(),
                }))
            } else {
                None
            }
        }
        Relation::Assignment => Some(parent_actual.clone()),
        Relation::FieldAccess | Relation::SuperFieldAccess => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn loc() -> SourceLocation {
        SourceLocation {
            file_id: 0,
            line: 1,
            column: 1,
        }
    }

    #[test]
    fn call_child_becomes_return_type() {
        let mut table = PlaceholderTable::new();
        table.register(0, None, loc());
        table.register(1, None, loc());
        table.link(0, 1, Relation::Call);

        let return_ty = TypeDefRef::new(TypeDef::simple(TypeKind::String));
        let sig = buzz_ir::types::FunctionSig {
            params: Default::default(),
            return_ty: return_ty.clone(),
            yield_ty: None,
        };
        let function_ty = TypeDefRef::new(TypeDef {
            optional: false,
            kind: TypeKind::Function,
            payload: Some(TypeUnion::Function(Arc::new(sig))),
        });
        table.resolve(0, function_ty).expect("no cycle in this graph");

        assert!(table.is_resolved(1));
        let placeholder_stand_in = TypeDefRef::new(TypeDef::simple(TypeKind::Placeholder));
        let effective = table.effective(1, &placeholder_stand_in);
        assert!(effective.eql(&return_ty));
    }

    #[test]
    fn first_writer_wins_on_relink() {
        let mut table = PlaceholderTable::new();
        table.register(0, None, loc());
        table.register(1, None, loc());
        table.register(2, None, loc());
        table.link(0, 1, Relation::Call);
        table.link(2, 1, Relation::Yield);
        assert_eq!(table.node(1).unwrap().parent, Some(0));
        assert_eq!(table.node(1).unwrap().parent_relation, Some(Relation::Call));
    }

    #[test]
    fn self_link_is_a_no_op() {
        let mut table = PlaceholderTable::new();
        table.register(0, None, loc());
        table.link(0, 0, Relation::Call);
        assert!(table.node(0).unwrap().parent.is_none());
    }

    #[test]
    fn unresolved_placeholder_reported_at_finish() {
        let mut table = PlaceholderTable::new();
        table.register(0, None, loc());
        assert!(table.finish().is_err());
    }
}
