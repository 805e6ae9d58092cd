//! Durable key/value storage used by the persistence gateway.
//!
//! `FileStorage` keeps one file per key under a storage directory, naming
//! each file by a hash of the key to avoid filesystem issues.
//! `MemoryStorage` is the in-process backend with an optional byte quota,
//! used for headless sessions and tests.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available in this environment")]
    Unavailable,
    #[error("storage quota exceeded ({needed} bytes needed, limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode stored record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_quota(&self) -> bool {
        match self {
            StorageError::QuotaExceeded { .. } => true,
            StorageError::Io(err) => err.kind() == io::ErrorKind::StorageFull,
            _ => false,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value store with local-storage semantics.
pub trait Storage {
    /// `false` when running somewhere durable storage cannot be reached.
    fn is_available(&self) -> bool {
        true
    }
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.key_path(key);
        // Write-then-rename so a crash never leaves a truncated record.
        let staging = path.with_extension("tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    available: bool,
    failures_remaining: usize,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// Reject writes that would grow the store past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// A backend that reports itself unavailable, like a server-side render.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with a generic I/O error.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.failures_remaining = count;
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn is_available(&self) -> bool {
        self.available
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(io::Error::other("injected write failure").into());
        }
        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_and_removes_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut storage = FileStorage::new(dir.path().join("store"));

        assert_eq!(storage.get("content").expect("get"), None);
        storage.set("content", "# Title").expect("set");
        assert_eq!(
            storage.get("content").expect("get").as_deref(),
            Some("# Title")
        );
        storage.remove("content").expect("remove");
        storage.remove("content").expect("removing twice is fine");
        assert_eq!(storage.get("content").expect("get"), None);
    }

    #[test]
    fn memory_quota_is_reported_as_quota_error() {
        let mut storage = MemoryStorage::with_quota(16);
        storage.set("k", "short").expect("fits");
        let err = storage
            .set("k", "this value is far too long")
            .expect_err("exceeds quota");
        assert!(err.is_quota());
        assert_eq!(storage.get("k").expect("get").as_deref(), Some("short"));
    }

    #[test]
    fn injected_failures_are_generic_and_consumed() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(1);
        let err = storage.set("k", "v").expect_err("first write fails");
        assert!(!err.is_quota());
        storage.set("k", "v").expect("second write succeeds");
    }

    #[test]
    fn unavailable_backend_rejects_everything() {
        let mut storage = MemoryStorage::unavailable();
        assert!(!storage.is_available());
        assert!(matches!(storage.get("k"), Err(StorageError::Unavailable)));
        assert!(matches!(
            storage.set("k", "v"),
            Err(StorageError::Unavailable)
        ));
    }
}
