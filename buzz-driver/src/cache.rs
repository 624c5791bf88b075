//! Bytecode cache stub: a file whose first 4 bytes are a magic and
//! version, with an opaque body beyond that — framing only, since no
//! chunk encoder exists in this workspace.
//!
//! Only a write/verify pair is implemented — no encoder/decoder for chunk
//! contents exists in this workspace, since emitting bytecode is itself
//! out of scope.

use std::io::{Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"BZZC";
const VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("cache file too short to contain a header")]
    Truncated,
    #[error("not a buzz bytecode cache (bad magic)")]
    BadMagic,
    #[error("cache was written by an incompatible version ({found}, expected {VERSION})")]
    VersionMismatch { found: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes `body` behind the magic+version header to `path`.
pub fn write(path: &Path, body: &[u8]) -> Result<(), CacheError> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(MAGIC)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(body)?;
    Ok(())
}

/// Reads and validates the header of a cache file, returning the opaque
/// body that follows it.
pub fn read(path: &Path) -> Result<Vec<u8>, CacheError> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    if buf.len() < 8 {
        return Err(CacheError::Truncated);
    }
    if &buf[0..4] != MAGIC {
        return Err(CacheError::BadMagic);
    }
    let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(CacheError::VersionMismatch { found: version });
    }
    Ok(buf[8..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_body() {
        let dir = std::env::temp_dir().join("buzz-cache-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("a.bzzc");
        write(&path, b"hello").unwrap();
        assert_eq!(read(&path).unwrap(), b"hello");
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = std::env::temp_dir().join("buzz-cache-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("b.bzzc");
        std::fs::write(&path, b"NOPE0000body").unwrap();
        assert!(matches!(read(&path), Err(CacheError::BadMagic)));
    }
}
