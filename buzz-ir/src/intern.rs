//! String interning, write-once per distinct string.
//!
//! A thin re-export over `lalrpop-intern`'s process-wide table, the crate
//! chalk-ir itself used for `Identifier`/`InternedString`. Equality on
//! `InternedString` is pointer/index identity, which is exactly what
//! makes strings hash and compare by identity.

pub use lalrpop_intern::InternedString;

pub fn intern(text: &str) -> InternedString {
    lalrpop_intern::intern(text)
}

pub fn text(id: InternedString) -> String {
    id.to_string()
}
