use super::metadata::SaveMetadata;
use crate::storage::{Storage, StorageError, StorageResult};
use tracing::warn;

pub const CONTENT_KEY: &str = "markdown-editor-content";
pub const META_KEY: &str = "markdown-editor-meta";

/// Content and metadata as last persisted. Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedDocument {
    pub content: Option<String>,
    pub metadata: Option<SaveMetadata>,
}

/// Reads and writes the two persisted entries.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    storage: S,
}

impl<S: Storage> PersistenceGateway<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_available()
    }

    /// Load what was last saved. Read or parse failures load as nothing.
    pub fn load(&self) -> SavedDocument {
        if !self.is_available() {
            return SavedDocument::default();
        }
        let content = match self.storage.get(CONTENT_KEY) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to load saved content: {err}");
                return SavedDocument::default();
            }
        };
        let metadata = match self.storage.get(META_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<SaveMetadata>(&raw) {
                Ok(metadata) => Some(metadata),
                Err(err) => {
                    warn!("Ignoring unreadable save metadata: {err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("Failed to load save metadata: {err}");
                None
            }
        };
        SavedDocument { content, metadata }
    }

    pub fn write(&mut self, content: &str, metadata: &SaveMetadata) -> StorageResult<()> {
        let encoded = serde_json::to_string(metadata)?;
        self.storage.set(CONTENT_KEY, content)?;
        self.storage.set(META_KEY, &encoded)
    }

    pub fn clear(&mut self) -> StorageResult<()> {
        self.storage.remove(CONTENT_KEY)?;
        self.storage.remove(META_KEY)
    }
}

/// User-facing message for a failed write.
pub fn failure_message(err: &StorageError) -> &'static str {
    if err.is_quota() {
        "Storage full"
    } else {
        "Save failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn write_then_load_returns_both_entries() {
        let mut gateway = PersistenceGateway::new(MemoryStorage::new());
        let meta = SaveMetadata::for_content("hello world", 1_000, 1);
        gateway.write("hello world", &meta).expect("write");

        let saved = gateway.load();
        assert_eq!(saved.content.as_deref(), Some("hello world"));
        assert_eq!(saved.metadata, Some(meta));

        gateway.clear().expect("clear");
        assert_eq!(gateway.load(), SavedDocument::default());
    }

    #[test]
    fn corrupt_metadata_loads_as_missing() {
        let mut storage = MemoryStorage::new();
        storage.set(CONTENT_KEY, "draft").expect("seed content");
        storage.set(META_KEY, "{not json").expect("seed meta");
        let saved = PersistenceGateway::new(storage).load();
        assert_eq!(saved.content.as_deref(), Some("draft"));
        assert_eq!(saved.metadata, None);
    }

    #[test]
    fn quota_failures_get_their_own_message() {
        let quota = StorageError::QuotaExceeded {
            needed: 10,
            limit: 5,
        };
        assert_eq!(failure_message(&quota), "Storage full");
        assert_eq!(
            failure_message(&StorageError::Unavailable),
            "Save failed"
        );
    }
}
