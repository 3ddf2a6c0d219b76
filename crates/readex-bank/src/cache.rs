//! Read-through JSON cache keyed by resolved file path.
//!
//! Bank files are read at most once per process: an in-progress attempt holds
//! indices into the exam set derived from a bank file, so re-reading the file
//! mid-process could change question content out from under it. Entries live
//! for the lifetime of the cache, which the owner constructs once at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::BankError;

/// Process-lifetime cache of parsed bank documents.
#[derive(Debug, Default)]
pub struct BankCache {
    entries: Mutex<HashMap<PathBuf, Arc<Value>>>,
}

impl BankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse `path`, or return the cached document from an earlier
    /// read of the same resolved path.
    pub fn read(&self, path: &Path) -> Result<Arc<Value>, BankError> {
        if !path.exists() {
            return Err(BankError::NotFound(path.to_path_buf()));
        }
        let resolved = path.canonicalize().map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(cached) = entries.get(&resolved) {
            return Ok(Arc::clone(cached));
        }

        let content = std::fs::read_to_string(&resolved).map_err(|source| BankError::Io {
            path: resolved.clone(),
            source,
        })?;
        let payload: Value = serde_json::from_str(&content).map_err(|source| BankError::Json {
            path: resolved.clone(),
            source,
        })?;

        tracing::debug!(path = %resolved.display(), "bank file loaded into cache");

        let payload = Arc::new(payload);
        entries.insert(resolved, Arc::clone(&payload));
        Ok(payload)
    }

    /// Drop all cached documents. Intended for tests.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn second_read_returns_cached_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, r#"{"passages": []}"#).unwrap();

        let cache = BankCache::new();
        let first = cache.read(&path).unwrap();

        // Rewrite the file; the cache must keep serving the original parse.
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{"passages": [{"id": "1"}]}"#).unwrap();
        drop(f);

        let second = cache.read(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_file_is_not_found() {
        let cache = BankCache::new();
        let err = cache.read(Path::new("/nonexistent/bank.json")).unwrap_err();
        assert!(matches!(err, BankError::NotFound(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = BankCache::new();
        let err = cache.read(&path).unwrap_err();
        assert!(matches!(err, BankError::Json { .. }));
    }

    #[test]
    fn clear_forces_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, r#"{"passages": []}"#).unwrap();

        let cache = BankCache::new();
        let first = cache.read(&path).unwrap();
        cache.clear();
        std::fs::write(&path, r#"{"passages": [{"id": "2"}]}"#).unwrap();
        let second = cache.read(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
