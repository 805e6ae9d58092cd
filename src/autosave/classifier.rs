//! Maps a content edit to a save delay.
//!
//! Pastes save immediately. Otherwise fast typing gets a short debounce, a
//! large accumulated delta a medium one, and everything else waits for idle.

use super::state::SaveState;
use crate::clock::Millis;
use crate::config::EditorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub large_paste_chars: usize,
    pub typing_speed_ms: Millis,
    pub significant_change_chars: usize,
    pub typing_fast_delay_ms: Millis,
    pub typing_slow_delay_ms: Millis,
    pub idle_delay_ms: Millis,
}

impl From<&EditorConfig> for ClassifierSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            large_paste_chars: config.large_paste_chars,
            typing_speed_ms: config.typing_speed_ms,
            significant_change_chars: config.significant_change_chars,
            typing_fast_delay_ms: config.typing_fast_delay_ms,
            typing_slow_delay_ms: config.typing_slow_delay_ms,
            idle_delay_ms: config.idle_delay_ms,
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub delay: Millis,
    pub is_paste: bool,
    pub is_typing_fast: bool,
}

/// Classify an edit from `old_len` to `new_len` characters at `now`.
///
/// Updates the accumulator on every edit. Pastes leave the keystroke clock
/// and the typing-speed flag untouched.
pub fn classify(
    settings: &ClassifierSettings,
    old_len: usize,
    new_len: usize,
    now: Millis,
    state: &mut SaveState,
) -> Classification {
    let change = old_len.abs_diff(new_len);
    state.unsaved_change_size = state.unsaved_change_size.saturating_add(change);

    if change > settings.large_paste_chars {
        return Classification {
            delay: 0,
            is_paste: true,
            is_typing_fast: state.is_typing_fast,
        };
    }

    let since_last = now.saturating_sub(state.last_keystroke_time);
    state.last_keystroke_time = now;
    state.is_typing_fast = since_last < settings.typing_speed_ms;

    let delay = if state.is_typing_fast {
        settings.typing_fast_delay_ms
    } else if state.unsaved_change_size > settings.significant_change_chars {
        settings.typing_slow_delay_ms
    } else {
        settings.idle_delay_ms
    };

    Classification {
        delay,
        is_paste: false,
        is_typing_fast: state.is_typing_fast,
    }
}
