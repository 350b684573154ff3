//! Persistent set of already-accepted order ids.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// In-memory dedup set backed by a JSON string-array file.
///
/// The file is rewritten wholesale (sorted, so saves are deterministic) on
/// every flush; concurrent readers are not expected.
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    ids: HashSet<String>,
}

impl DedupStore {
    /// Load the persisted set.
    ///
    /// A missing file yields an empty set. Entries that are not non-empty
    /// strings are discarded, and an unreadable file is treated as empty
    /// with a warning - corrupt state must not take the poller down.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<Value>>(&raw) {
                Ok(values) => values
                    .into_iter()
                    .filter_map(|value| match value {
                        Value::String(s) if !s.is_empty() => Some(s),
                        _ => None,
                    })
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "seen-ids file is corrupt, starting empty");
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` when the id was not present yet.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rewrite the file with the current set, sorted.
    pub fn flush(&self) -> StoreResult<()> {
        let mut sorted: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        sorted.sort_unstable();

        let body = serde_json::to_string_pretty(&sorted).map_err(|e| StoreError::Encode {
            path: self.path.display().to_string(),
            source: e,
        })?;

        std::fs::write(&self.path, body).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_entries_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        std::fs::write(&path, r#"["a", 7, "", null, "b"]"#).unwrap();

        let store = DedupStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(store.contains("b"));
    }

    #[test]
    fn unparseable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = DedupStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn flush_writes_sorted_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_ids.json");

        let mut store = DedupStore::load(&path).unwrap();
        assert!(store.insert("beta"));
        assert!(store.insert("alpha"));
        assert!(!store.insert("beta"));
        store.flush().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.find("alpha").unwrap() < raw.find("beta").unwrap());

        let reloaded = DedupStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("alpha"));
    }
}
