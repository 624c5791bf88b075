//! Structural hash-consing of `TypeDef`s: two `TypeDef`s with equal
//! structure must point to the same object, except `Object` and `Enum`
//! payloads, which are nominal and never collapsed.
//!
//! Grounded in chalk-ir's `InternedTy`/`Interner::intern_ty`: the registry
//! is keyed by structural content, but — as chalk does for its own
//! already-interned substructure — nested `TypeDefRef`s are compared by
//! pointer identity rather than recursively, since any `TypeDefRef` handed
//! to `intern` was itself produced by this same registry.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use buzz_ir::placeholder::{PlaceholderDef, PlaceholderId, SourceLocation, TypeDefRef};
use buzz_ir::types::{TypeDef, TypeKind, TypeUnion};

/// A structural key over an already-canonicalized `TypeDef`. Two defs with
/// equal keys are guaranteed interchangeable by `TypeDef::eql`.
#[derive(PartialEq, Eq, Hash, Clone)]
struct CanonKey {
    optional: bool,
    kind: TypeKind,
    payload: PayloadKey,
}

#[derive(PartialEq, Eq, Hash, Clone)]
enum PayloadKey {
    None,
    Function {
        return_ty: usize,
        yield_ty: Option<usize>,
        params: Vec<usize>,
    },
    Map {
        key: usize,
        value: usize,
    },
    List {
        item: usize,
    },
    Fiber {
        return_ty: usize,
        yield_ty: usize,
    },
    /// Placeholders are never hash-consed: every `new_placeholder` call
    /// must yield a distinct identity, so it is keyed by its own id.
    Placeholder(PlaceholderId),
}

fn ptr_key(r: &TypeDefRef) -> usize {
    Arc::as_ptr(&r.0) as usize
}

fn payload_key(p: &Option<TypeUnion>) -> PayloadKey {
    match p {
        None => PayloadKey::None,
        Some(TypeUnion::Function(sig)) => PayloadKey::Function {
            return_ty: ptr_key(&sig.return_ty),
            yield_ty: sig.yield_ty.as_ref().map(ptr_key),
            params: sig.params.iter().map(|p| ptr_key(&p.ty)).collect(),
        },
        Some(TypeUnion::Map { key, value }) => PayloadKey::Map {
            key: ptr_key(key),
            value: ptr_key(value),
        },
        Some(TypeUnion::List { item }) => PayloadKey::List {
            item: ptr_key(item),
        },
        Some(TypeUnion::Fiber {
            return_ty,
            yield_ty,
        }) => PayloadKey::Fiber {
            return_ty: ptr_key(return_ty),
            yield_ty: ptr_key(yield_ty),
        },
        Some(TypeUnion::Placeholder(def)) => PayloadKey::Placeholder(def.id),
        Some(TypeUnion::Nominal(_)) => unreachable!("nominal defs bypass the canon table"),
        Some(TypeUnion::Class(_)) => {
            unreachable!("class-carrying types are runtime-only and never interned")
        }
    }
}

/// Append-only during compilation, read-only thereafter.
pub struct TypeRegistry {
    canon: FxHashMap<CanonKey, TypeDefRef>,
    next_nominal_id: u64,
    next_placeholder_id: PlaceholderId,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            canon: FxHashMap::default(),
            next_nominal_id: 0,
            next_placeholder_id: 0,
        }
    }

    /// Canonicalizes `def`: returns an existing `TypeDefRef` with identical
    /// structure if one exists, otherwise interns `def` and returns it.
    /// `Object`/`Enum` kinds always get a fresh nominal identity instead.
    pub fn intern(&mut self, def: TypeDef) -> TypeDefRef {
        if matches!(def.kind, TypeKind::Object | TypeKind::Enum) {
            return self.intern_nominal(def);
        }
        if def.kind == TypeKind::Placeholder {
            // Placeholders are identity-keyed by their own id, set by
            // `new_placeholder` below; reaching `intern` for one directly
            // would indicate a bug in the caller, so just wrap it.
            return TypeDefRef::new(def);
        }
        let key = CanonKey {
            optional: def.optional,
            kind: def.kind,
            payload: payload_key(&def.payload),
        };
        if let Some(existing) = self.canon.get(&key) {
            return existing.clone();
        }
        let interned = TypeDefRef::new(def);
        self.canon.insert(key, interned.clone());
        interned
    }

    fn intern_nominal(&mut self, mut def: TypeDef) -> TypeDefRef {
        let id = self.next_nominal_id;
        self.next_nominal_id += 1;
        def.payload = Some(TypeUnion::Nominal(id));
        TypeDefRef::new(def)
    }

    /// Allocates a fresh `Placeholder` TypeDef.
    pub fn new_placeholder(
        &mut self,
        name: Option<lalrpop_intern::InternedString>,
        location: SourceLocation,
    ) -> TypeDefRef {
        let id = self.next_placeholder_id;
        self.next_placeholder_id += 1;
        let placeholder_def = PlaceholderDef::new(id, name, location);
        TypeDefRef::new(TypeDef {
            optional: false,
            kind: TypeKind::Placeholder,
            payload: Some(TypeUnion::Placeholder(placeholder_def)),
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzz_ir::placeholder::TypeDefRef as Tdr;

    #[test]
    fn structurally_equal_lists_collapse_to_one_object() {
        let mut reg = TypeRegistry::new();
        let string_ty = reg.intern(TypeDef::simple(TypeKind::String));
        let list_a = reg.intern(TypeDef {
            optional: false,
            kind: TypeKind::List,
            payload: Some(TypeUnion::List {
                item: string_ty.clone(),
            }),
        });
        let list_b = reg.intern(TypeDef {
            optional: false,
            kind: TypeKind::List,
            payload: Some(TypeUnion::List { item: string_ty }),
        });
        assert!(Tdr::same_object(&list_a, &list_b));
    }

    #[test]
    fn object_definitions_are_never_collapsed() {
        let mut reg = TypeRegistry::new();
        let a = reg.intern(TypeDef::simple(TypeKind::Object));
        let b = reg.intern(TypeDef::simple(TypeKind::Object));
        assert!(!Tdr::same_object(&a, &b));
        assert!(a.eql(&b), "still structurally eql despite distinct identity");
    }
}
