use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Record persisted next to the raw content on every successful save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveMetadata {
    pub timestamp: Millis,
    pub character_count: usize,
    pub hash: String,
    pub word_count: usize,
    pub save_count: u64,
}

impl SaveMetadata {
    pub fn for_content(content: &str, timestamp: Millis, save_count: u64) -> Self {
        Self {
            timestamp,
            character_count: content.chars().count(),
            hash: fingerprint(content),
            word_count: word_count(content),
            save_count,
        }
    }
}

/// Short stable content hash: the first 16 hex digits of SHA-256.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|byte| format!("{byte:02x}")).collect()
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = fingerprint("# Notes\n");
        assert_eq!(a, fingerprint("# Notes\n"));
        assert_ne!(a, fingerprint("# Notes"));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn metadata_serializes_with_camel_case_keys() {
        let meta = SaveMetadata::for_content("one two  three\n", 42, 3);
        assert_eq!(meta.word_count, 3);
        assert_eq!(meta.character_count, 15);

        let json = serde_json::to_string(&meta).expect("serialize metadata");
        assert!(json.contains("\"characterCount\":15"));
        assert!(json.contains("\"saveCount\":3"));
        let back: SaveMetadata = serde_json::from_str(&json).expect("parse metadata");
        assert_eq!(back, meta);
    }

    #[test]
    fn blank_content_has_no_words() {
        assert_eq!(word_count("   \n\t"), 0);
    }
}
