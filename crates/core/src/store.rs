use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Outcome of reading an index file. Loading never fails outright: a missing
/// and an unreadable index are both reported so the caller can rebuild.
#[derive(Debug)]
pub enum Loaded<T> {
    Found(T),
    NotFound,
    Corrupt(String),
}

impl<T: Default> Loaded<T> {
    /// Collapse into `(value, dirty)`: absent or corrupt indexes become an
    /// empty value that must be written back.
    pub fn or_rebuild(self) -> (T, bool) {
        match self {
            Loaded::Found(value) => (value, false),
            Loaded::NotFound | Loaded::Corrupt(_) => (T::default(), true),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Loaded::Found(value) => Some(value),
            Loaded::NotFound | Loaded::Corrupt(_) => None,
        }
    }
}

/// Read and decode an index file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => return Loaded::NotFound,
        Err(error) => {
            log::warn!("index read failed for {}: {}", path.display(), error);
            return Loaded::Corrupt(error.to_string());
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Loaded::Found(value),
        Err(error) => {
            log::warn!("index decode failed for {}: {}", path.display(), error);
            Loaded::Corrupt(error.to_string())
        }
    }
}

/// Serialize an index the way it is stored on disk: four-space indented JSON,
/// non-ASCII text left unescaped, trailing newline.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

/// Write an index file atomically: the data goes to a temp file in the same
/// directory which then replaces `path`. On failure the prior file is untouched.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = to_bytes(value)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote index {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
