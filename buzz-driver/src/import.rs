//! Import resolution: relative to the
//! importing file, then `BUZZ_PATH`, then built-in library names.

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
#[error("could not resolve import \"{name}\" (searched relative to {from}, BUZZ_PATH, and built-ins)")]
pub struct ImportError {
    name: String,
    from: String,
}

const BUILTIN_LIBS: &[&str] = &["io", "fs", "os", "math", "buffer", "debug", "gc"];

pub enum Resolved {
    /// A `.buzz` source file found on disk.
    Source(PathBuf),
    /// One of the host-provided shared-object libraries; loading them is
    /// out of scope for this crate, so resolution only confirms the name.
    Builtin(String),
}

/// Resolves `name` as imported from `importing_file`.
pub fn resolve(name: &str, importing_file: &Path) -> Result<Resolved, ImportError> {
    if let Some(dir) = importing_file.parent() {
        let candidate = dir.join(format!("{name}.buzz"));
        if candidate.is_file() {
            return Ok(Resolved::Source(candidate));
        }
    }

    if let Ok(buzz_path) = std::env::var("BUZZ_PATH") {
        for root in std::env::split_paths(&buzz_path) {
            let candidate = root.join(format!("{name}.buzz"));
            if candidate.is_file() {
                return Ok(Resolved::Source(candidate));
            }
        }
    }

    if BUILTIN_LIBS.contains(&name) {
        return Ok(Resolved::Builtin(name.to_string()));
    }

    Err(ImportError {
        name: name.to_string(),
        from: importing_file.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_builtin_library_names() {
        let result = resolve("math", Path::new("/tmp/does-not-exist/script.buzz"));
        assert!(matches!(result, Ok(Resolved::Builtin(name)) if name == "math"));
    }

    #[test]
    fn errors_on_unknown_import() {
        let result = resolve("nonexistent_module", Path::new("/tmp/script.buzz"));
        assert!(result.is_err());
    }
}
