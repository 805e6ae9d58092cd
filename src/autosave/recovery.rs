use super::gateway::SavedDocument;
use super::metadata::SaveMetadata;
use crate::clock::{DAY_MS, Millis};
use serde::Serialize;

/// Previously saved content the user may choose to restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverableContent {
    pub content: String,
    pub metadata: SaveMetadata,
}

/// Offer saved content only when the editor is blank, the saved copy has
/// text, and it was written within the last `window_days`.
pub fn find_recoverable(
    saved: SavedDocument,
    live_content: &str,
    now: Millis,
    window_days: u64,
) -> Option<RecoverableContent> {
    if !live_content.trim().is_empty() {
        return None;
    }
    let (Some(content), Some(metadata)) = (saved.content, saved.metadata) else {
        return None;
    };
    if content.trim().is_empty() {
        return None;
    }
    let window = window_days.saturating_mul(DAY_MS);
    if now.saturating_sub(metadata.timestamp) >= window {
        return None;
    }
    Some(RecoverableContent { content, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved_at(content: &str, timestamp: Millis) -> SavedDocument {
        SavedDocument {
            content: Some(content.to_string()),
            metadata: Some(SaveMetadata::for_content(content, timestamp, 4)),
        }
    }

    #[test]
    fn recent_content_is_offered_to_a_blank_editor() {
        let found = find_recoverable(saved_at("# Draft", 0), "  \n", 6 * DAY_MS, 7)
            .expect("recoverable");
        assert_eq!(found.content, "# Draft");
        assert_eq!(found.metadata.save_count, 4);
    }

    #[test]
    fn nothing_is_offered_over_live_text() {
        assert!(find_recoverable(saved_at("# Draft", 0), "typing", 10, 7).is_none());
    }

    #[test]
    fn stale_or_blank_content_is_not_offered() {
        assert!(find_recoverable(saved_at("# Draft", 0), "", 7 * DAY_MS, 7).is_none());
        assert!(find_recoverable(saved_at("   ", 0), "", 10, 7).is_none());
        let missing_meta = SavedDocument {
            content: Some("# Draft".to_string()),
            metadata: None,
        };
        assert!(find_recoverable(missing_meta, "", 10, 7).is_none());
    }
}
