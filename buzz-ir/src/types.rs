//! The static type descriptor and its equality/assignability
//! rules.
//!
//! Grounded in chalk-ir's `Ty`/`ApplicationTy` split: a small closed kind
//! enum (`TypeKind`, analogous to chalk's `TypeName`) paired with an
//! optional structured payload (`TypeUnion`, analogous to chalk's
//! `ApplicationTy::parameters`).

use lalrpop_intern::InternedString;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::placeholder::{PlaceholderDef, TypeDefRef};
use crate::value::ObjRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Bool,
    Number,
    String,
    Pattern,
    Type,
    Void,
    UserData,
    Fiber,
    ObjectInstance,
    EnumInstance,
    Object,
    Enum,
    List,
    Map,
    Function,
    Placeholder,
}

/// A named function parameter, ordered by insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionParam {
    pub name: InternedString,
    pub ty: TypeDefRef,
    pub default: Option<()>, // default-value constant; opaque to this crate
}

#[derive(Clone, Debug)]
pub struct FunctionSig {
    /// Most calls pass a handful of arguments; `SmallVec` keeps a typical
    /// signature's parameter list off the heap entirely.
    pub params: SmallVec<[FunctionParam; 4]>,
    pub return_ty: TypeDefRef,
    pub yield_ty: Option<TypeDefRef>,
}

/// Kind-specific payload carried by a `TypeDef`.
#[derive(Clone, Debug)]
pub enum TypeUnion {
    Function(Arc<FunctionSig>),
    Map {
        key: TypeDefRef,
        value: TypeDefRef,
    },
    List {
        item: TypeDefRef,
    },
    Fiber {
        return_ty: TypeDefRef,
        yield_ty: TypeDefRef,
    },
    Placeholder(PlaceholderDef),
    /// Nominal payload for `Object`/`Enum`: identity is the defining
    /// `ItemId`-like handle, never collapsed by structural equality.
    Nominal(u64),
    /// A runtime `is`/`as` test against one specific live class, carried
    /// directly rather than through a nominal id: the bytecode operators
    /// that need a concrete class (as opposed to "any object") hand the
    /// class's `ObjRef` straight to `dispatch::is` rather than round-trip
    /// through the compile-time registry.
    Class(ObjRef),
}

#[derive(Clone, Debug)]
pub struct TypeDef {
    pub optional: bool,
    pub kind: TypeKind,
    pub payload: Option<TypeUnion>,
}

impl TypeDef {
    pub fn simple(kind: TypeKind) -> Self {
        TypeDef {
            optional: false,
            kind,
            payload: None,
        }
    }

    pub fn optional_of(kind: TypeKind) -> Self {
        TypeDef {
            optional: true,
            kind,
            payload: None,
        }
    }

    pub fn clone_optional(&self) -> Self {
        TypeDef {
            optional: true,
            kind: self.kind,
            payload: self.payload.clone(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == TypeKind::Placeholder
    }

    /// Structural type equality.
    ///
    /// `Void` is permissively equal to any optional type and `Placeholder`
    /// is loosely equal to anything — both are concessions the spec calls
    /// out explicitly, kept here as special cases rather than folded into
    /// the general payload comparison so `eql` stays a true equivalence
    /// relation over non-placeholder, non-`Void` types.
    pub fn eql(&self, other: &TypeDef) -> bool {
        if self.kind == TypeKind::Placeholder || other.kind == TypeKind::Placeholder {
            return true;
        }
        if self.kind == TypeKind::Void && other.optional {
            return true;
        }
        if other.kind == TypeKind::Void && self.optional {
            return true;
        }
        if self.optional != other.optional {
            return false;
        }
        self.structurally_eql(other)
    }

    /// `eql` minus the `optional` bit: kind and payload only. Pulled out of
    /// `eql` for callers that already resolved nullability themselves —
    /// `dispatch::is`'s null check runs before any object-kind comparison
    /// reaches this far, so re-checking `optional` here would be redundant.
    pub fn structurally_eql(&self, other: &TypeDef) -> bool {
        if self.kind == TypeKind::Placeholder || other.kind == TypeKind::Placeholder {
            return true;
        }
        if self.kind != other.kind {
            return false;
        }
        match (&self.payload, &other.payload) {
            (None, None) => true,
            (Some(a), Some(b)) => a.union_eql(b),
            _ => false,
        }
    }

    /// Assignability: can a value of `self` be stored where `target` is
    /// expected. Strictly weaker than `eql` only in one direction — a
    /// non-optional may flow into an optional of the same shape, but not
    /// the reverse.
    pub fn assignable_to(&self, target: &TypeDef) -> bool {
        if self.eql(target) {
            return true;
        }
        if target.optional && !self.optional {
            let widened = self.clone_optional();
            return widened.eql(target);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_is_assignable_to_optional_but_not_eql_reflexive() {
        let void = TypeDef::simple(TypeKind::Void);
        let opt_num = TypeDef::optional_of(TypeKind::Number);
        assert!(void.eql(&opt_num));
        assert!(TypeDef::simple(TypeKind::Number).assignable_to(&opt_num));
    }

    #[test]
    fn non_optional_not_assignable_from_optional() {
        let num = TypeDef::simple(TypeKind::Number);
        let opt_num = TypeDef::optional_of(TypeKind::Number);
        assert!(!opt_num.assignable_to(&num));
    }

    #[test]
    fn eql_transitive_for_non_placeholder_types() {
        let a = TypeDef::simple(TypeKind::String);
        let b = TypeDef::simple(TypeKind::String);
        let c = TypeDef::simple(TypeKind::String);
        assert!(a.eql(&b) && b.eql(&c) && a.eql(&c));
    }

    #[test]
    fn placeholder_loosely_equal_to_anything() {
        let placeholder = TypeDef::simple(TypeKind::Placeholder);
        let num = TypeDef::simple(TypeKind::Number);
        assert!(placeholder.eql(&num));
        assert!(num.eql(&placeholder));
    }

    #[test]
    fn structurally_eql_ignores_optional() {
        let a = TypeDef::simple(TypeKind::Number);
        let b = TypeDef::optional_of(TypeKind::Number);
        assert!(a.structurally_eql(&b));
        assert!(!a.eql(&b));
    }

    #[test]
    fn list_item_type_compared_structurally() {
        let a = TypeDef {
            optional: false,
            kind: TypeKind::List,
            payload: Some(TypeUnion::List {
                item: TypeDefRef::new(TypeDef::simple(TypeKind::String)),
            }),
        };
        let b = TypeDef {
            optional: false,
            kind: TypeKind::List,
            payload: Some(TypeUnion::List {
                item: TypeDefRef::new(TypeDef::simple(TypeKind::String)),
            }),
        };
        assert!(a.eql(&b));
    }
}

impl TypeUnion {
    fn union_eql(&self, other: &TypeUnion) -> bool {
        match (self, other) {
            (TypeUnion::Function(a), TypeUnion::Function(b)) => {
                a.return_ty.eql(&b.return_ty)
                    && match (&a.yield_ty, &b.yield_ty) {
                        (Some(x), Some(y)) => x.eql(y),
                        (None, None) => true,
                        _ => false,
                    }
                    && a.params.len() == b.params.len()
                    && a.params
                        .iter()
                        .zip(b.params.iter())
                        .all(|(p, q)| p.ty.eql(&q.ty))
            }
            (TypeUnion::Map { key: k1, value: v1 }, TypeUnion::Map { key: k2, value: v2 }) => {
                k1.eql(k2) && v1.eql(v2)
            }
            (TypeUnion::List { item: a }, TypeUnion::List { item: b }) => a.eql(b),
            (
                TypeUnion::Fiber {
                    return_ty: r1,
                    yield_ty: y1,
                },
                TypeUnion::Fiber {
                    return_ty: r2,
                    yield_ty: y2,
                },
            ) => r1.eql(r2) && y1.eql(y2),
            (TypeUnion::Nominal(a), TypeUnion::Nominal(b)) => a == b,
            (TypeUnion::Class(a), TypeUnion::Class(b)) => a.as_ptr() == b.as_ptr(),
            (TypeUnion::Placeholder(_), _) | (_, TypeUnion::Placeholder(_)) => true,
            _ => false,
        }
    }
}
