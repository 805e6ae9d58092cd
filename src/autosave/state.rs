use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Mutable autosave bookkeeping, written only by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveState {
    pub status: SaveStatus,
    pub error: Option<String>,
    /// Absolute character delta accumulated since the last successful save.
    pub unsaved_change_size: usize,
    pub last_keystroke_time: Millis,
    pub is_typing_fast: bool,
}

impl SaveState {
    pub fn starting_at(now: Millis) -> Self {
        Self {
            last_keystroke_time: now,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default, TS)]
#[ts(export)]
pub struct SaveStats {
    pub total_saves: u64,
    pub failed_saves: u64,
    pub last_save_size: usize,
}

/// What the status indicator renders.
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export)]
pub struct SaveStatusView {
    pub status: SaveStatus,
    pub error: Option<String>,
    pub has_unsaved_changes: bool,
    pub is_typing_fast: bool,
    pub last_save_ago_secs: Option<u64>,
    pub stats: SaveStats,
}
