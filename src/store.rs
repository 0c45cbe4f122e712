//! Persistence port.
//!
//! The gate's two collections (PIN groups and access mappings) live in a flat
//! key-value store owned by the host. Each logical key holds one JSON array,
//! last write wins. Implement [`Persistence`] to back it with browser storage,
//! a database, or anything else that can get/set a string by key.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{PinGateError, Result};

/// A flat key-value store holding serialized collections.
///
/// Implementations are shared behind an `Arc` and handed to every store
/// handle, so methods take `&self`.
pub trait Persistence: Send + Sync {
    /// Return the raw value stored under `key`, if any.
    fn load_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn save_raw(&self, key: &str, value: &str) -> Result<()>;
}

/// Load the collection stored under `key` for display.
///
/// A missing key, a read failure, or a value that does not parse as `Vec<T>`
/// all yield an empty collection. Never feed the result back into [`save`];
/// mutations go through [`load_for_update`].
pub fn load<T: DeserializeOwned>(port: &dyn Persistence, key: &str) -> Vec<T> {
    match port.load_raw(key) {
        Ok(raw) => parse_or_empty(key, raw),
        Err(err) => {
            warn!(key, error = %err, "failed to read stored collection, treating as empty");
            Vec::new()
        }
    }
}

/// Load the collection stored under `key` as the read half of a
/// read-modify-write.
///
/// A read failure is returned so the caller never saves a partial collection
/// over the stored one. A missing or unparseable value is still empty.
pub fn load_for_update<T: DeserializeOwned>(port: &dyn Persistence, key: &str) -> Result<Vec<T>> {
    let raw = port.load_raw(key)?;
    Ok(parse_or_empty(key, raw))
}

fn parse_or_empty<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn!(key, error = %err, "stored collection does not parse, treating as empty");
            Vec::new()
        }
    }
}

/// Replace the collection stored under `key`.
pub fn save<T: Serialize>(port: &dyn Persistence, key: &str, items: &[T]) -> Result<()> {
    let json = serde_json::to_string(items)?;
    port.save_raw(key, &json)
}

// ---------------------------------------------------------------------------
// Built-in port: memory
// ---------------------------------------------------------------------------

/// Process-local store. Useful for tests and for hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryPersistence {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PinGateError::Persistence("memory store poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PinGateError::Persistence("memory store poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in port: directory of JSON files
// ---------------------------------------------------------------------------

/// Stores each logical key as `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous collection intact.
#[derive(Debug)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PinGateError::Persistence(format!(
                "invalid storage key: {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Persistence for FilePersistence {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
