//! Lazy native-method materialization for Strings, Lists, Maps, Patterns
//! and Fibers.
//!
//! `memberDef` is the only place this crate reads a source-literal
//! signature (`"append(value) > list"`); it is a tiny ad hoc reader rather
//! than a reuse of the excluded parser front-end, whose syntactic grammar
//! has no other caller in this workspace.

use std::cell::OnceCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use buzz_ir::intern::{self, InternedString};
use buzz_ir::object::{NativeFn, ObjHeader, ObjKind, ObjNative};
use buzz_ir::placeholder::TypeDefRef;
use buzz_ir::types::{FunctionParam, FunctionSig, TypeDef, TypeKind, TypeUnion};
use buzz_ir::value::ObjRef;
use buzz_vm::error::RuntimeError;
use buzz_vm::gc::Heap;
use buzz_vm::roots::RootSource;

use crate::registry::TypeRegistry;

/// One built-in method: its native entry point plus its declared Buzz
/// signature, parsed once and cached.
#[derive(Clone)]
pub struct MemberDef {
    pub name: InternedString,
    pub signature: &'static str,
    pub function: NativeFn,
}

/// Per-kind static dispatch table. `by_kind` is built from `entries` the
/// first time anything resolves a member, not at construction: a program
/// that never calls a built-in method never pays for interning every
/// signature's method name.
pub struct MemberTable {
    entries: &'static [(ObjKind, &'static str, NativeFn)],
    by_kind: OnceCell<FxHashMap<ObjKind, Vec<MemberDef>>>,
    def_cache: FxHashMap<(ObjKind, InternedString), TypeDefRef>,
    /// Bound `ObjNative`s, one per `(kind, name)` actually looked up.
    /// Mirrors `def_cache`'s laziness: a native is allocated on the heap
    /// only the first time a caller wants to hold it as a `Value`, e.g. to
    /// bind it onto an instance (`receiver.append`).
    native_cache: FxHashMap<(ObjKind, InternedString), ObjRef>,
}

const BUILTIN_ENTRIES: &[(ObjKind, &str, NativeFn)] = &[
    (ObjKind::List, "append(value) > list", buzz_vm::natives::list_append),
    (ObjKind::List, "len() > num", buzz_vm::natives::list_len),
    (ObjKind::List, "remove(index) > void?", buzz_vm::natives::list_remove),
    (ObjKind::List, "sub(start, len) > list", buzz_vm::natives::list_sub),
    (ObjKind::List, "indexOf(value) > num?", buzz_vm::natives::list_index_of),
    (ObjKind::List, "join(sep) > str", buzz_vm::natives::list_join),
    (ObjKind::List, "next(k) > num?", buzz_vm::natives::list_next),
    (ObjKind::Map, "size() > num", buzz_vm::natives::map_size),
    (ObjKind::Map, "remove(key) > void?", buzz_vm::natives::map_remove),
    (ObjKind::Map, "keys() > list", buzz_vm::natives::map_keys),
    (ObjKind::Map, "values() > list", buzz_vm::natives::map_values),
    (ObjKind::Map, "rawNext(prev) > void?", buzz_vm::natives::map_raw_next),
    (ObjKind::String, "sub(start, len) > str", buzz_vm::natives::string_sub),
    (
        ObjKind::String,
        "encodeBase64() > str",
        buzz_vm::natives::string_encode_base64,
    ),
    (
        ObjKind::String,
        "decodeBase64() > str",
        buzz_vm::natives::string_decode_base64,
    ),
];

impl MemberTable {
    pub fn new(entries: &'static [(ObjKind, &'static str, NativeFn)]) -> Self {
        MemberTable {
            entries,
            by_kind: OnceCell::new(),
            def_cache: FxHashMap::default(),
            native_cache: FxHashMap::default(),
        }
    }

    fn table(&self) -> &FxHashMap<ObjKind, Vec<MemberDef>> {
        self.by_kind.get_or_init(|| {
            let mut by_kind: FxHashMap<ObjKind, Vec<MemberDef>> = FxHashMap::default();
            for &(kind, sig, function) in self.entries {
                let name = intern::intern(method_name(sig));
                by_kind.entry(kind).or_default().push(MemberDef {
                    name,
                    signature: sig,
                    function,
                });
            }
            by_kind
        })
    }

    /// `member(name)`: looks up the named native for `kind`.
    pub fn member(&self, kind: ObjKind, name: InternedString) -> Option<&MemberDef> {
        self.table().get(&kind)?.iter().find(|m| m.name == name)
    }

    /// The built-in dispatch table for List, Map and String, wired to the
    /// native bodies in `buzz_vm::natives`.
    pub fn builtin() -> Self {
        MemberTable::new(BUILTIN_ENTRIES)
    }

    /// `memberDef(name)`: parses and caches the method's
    /// declared `FunctionSig`-shaped `TypeDef`.
    pub fn member_def(
        &mut self,
        registry: &mut TypeRegistry,
        kind: ObjKind,
        name: InternedString,
    ) -> Option<TypeDefRef> {
        if let Some(cached) = self.def_cache.get(&(kind, name)) {
            return Some(cached.clone());
        }
        let member = self.member(kind, name)?.clone();
        let def = parse_signature(registry, member.signature);
        self.def_cache.insert((kind, name), def.clone());
        Some(def)
    }

    /// Returns the bound `ObjNative` for `(kind, name)`, allocating it on
    /// `heap` the first time it is asked for. `None` if no such member
    /// exists; `Err` only if the heap is at its configured limit.
    pub fn native(
        &mut self,
        registry: &mut TypeRegistry,
        heap: &mut Heap,
        roots: &dyn RootSource,
        kind: ObjKind,
        name: InternedString,
    ) -> Result<Option<ObjRef>, RuntimeError> {
        if let Some(&cached) = self.native_cache.get(&(kind, name)) {
            return Ok(Some(cached));
        }
        let member = match self.member(kind, name) {
            Some(m) => m.clone(),
            None => return Ok(None),
        };
        let def = self
            .member_def(registry, kind, name)
            .expect("member just resolved above, so its signature must parse");
        let obj = heap.allocate(
            roots,
            ObjNative {
                header: ObjHeader::new(ObjKind::Native),
                name: member.name,
                function: member.function,
                def,
            },
        )?;
        self.native_cache.insert((kind, name), obj);
        Ok(Some(obj))
    }
}

fn method_name(sig: &str) -> &str {
    sig.split('(').next().unwrap_or(sig).trim()
}

/// Parses signatures of the shape `"name(param, param) > returnKind"` or
/// `"name() > returnKind?"` into a `Function` `TypeDef`. Parameter and
/// return kinds are restricted to the primitive `TypeKind`s built-ins
/// actually use; compound return types (e.g. `[str]`) are spelled with a
/// single trailing `[]`.
fn parse_signature(registry: &mut TypeRegistry, sig: &str) -> TypeDefRef {
    let open = sig.find('(').expect("member signature missing '('");
    let close = sig.find(')').expect("member signature missing ')'");
    let params_src = &sig[open + 1..close];
    let return_src = sig
        .rsplit('>')
        .next()
        .map(str::trim)
        .unwrap_or("void");

    let params = params_src
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|param_name| FunctionParam {
            name: intern::intern(param_name),
            ty: registry.intern(TypeDef::simple(TypeKind::Placeholder)),
            default: None,
        })
        .collect();

    let return_ty = registry.intern(parse_return_kind(return_src));

    registry.intern(TypeDef {
        optional: false,
        kind: TypeKind::Function,
        payload: Some(TypeUnion::Function(Arc::new(FunctionSig {
            params,
            return_ty,
            yield_ty: None,
        }))),
    })
}

fn parse_return_kind(src: &str) -> TypeDef {
    let (base, optional) = match src.strip_suffix('?') {
        Some(b) => (b, true),
        None => (src, false),
    };
    let kind = match base.trim_end_matches("[]") {
        "num" => TypeKind::Number,
        "str" => TypeKind::String,
        "bool" => TypeKind::Bool,
        "void" => TypeKind::Void,
        "list" => TypeKind::List,
        "map" => TypeKind::Map,
        _ => TypeKind::Placeholder,
    };
    if optional {
        TypeDef::optional_of(kind)
    } else {
        TypeDef::simple(kind)
    }
}
