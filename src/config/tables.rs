use super::defaults;
use super::models::{EditorConfig, LogLevel};
use serde::Deserialize;

/// On-disk layout of `conf/config.toml`: one table per subsystem.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    autosave: AutosaveConfig,
    #[serde(default)]
    scroll_sync: ScrollSyncConfig,
    #[serde(default)]
    editor: EditorTable,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for EditorConfig {
    fn from(tables: ConfigTables) -> Self {
        EditorConfig {
            typing_fast_delay_ms: tables.autosave.typing_fast_delay_ms,
            typing_slow_delay_ms: tables.autosave.typing_slow_delay_ms,
            idle_delay_ms: tables.autosave.idle_delay_ms,
            after_blur_delay_ms: tables.autosave.after_blur_delay_ms,
            saved_status_display_ms: tables.autosave.saved_status_display_ms,
            error_status_display_ms: tables.autosave.error_status_display_ms,
            retry_delay_ms: tables.autosave.retry_delay_ms,
            throttle_save_ms: tables.autosave.throttle_save_ms,
            periodic_save_ms: tables.autosave.periodic_save_ms,
            significant_change_chars: tables.autosave.significant_change_chars,
            large_paste_chars: tables.autosave.large_paste_chars,
            typing_speed_ms: tables.autosave.typing_speed_ms,
            recovery_window_days: tables.autosave.recovery_window_days,
            sync_enabled: tables.scroll_sync.enabled,
            quiescence_ms: tables.scroll_sync.quiescence_ms,
            pointer_quiescence_ms: tables.scroll_sync.pointer_quiescence_ms,
            jitter_threshold_px: tables.scroll_sync.jitter_threshold_px,
            scroll_to_element_ms: tables.scroll_sync.scroll_to_element_ms,
            render_debounce_ms: tables.editor.render_debounce_ms,
            reading_wpm: tables.editor.reading_wpm,
            storage_dir: tables.storage.storage_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&EditorConfig> for ConfigTables {
    fn from(config: &EditorConfig) -> Self {
        ConfigTables {
            autosave: AutosaveConfig {
                typing_fast_delay_ms: config.typing_fast_delay_ms,
                typing_slow_delay_ms: config.typing_slow_delay_ms,
                idle_delay_ms: config.idle_delay_ms,
                after_blur_delay_ms: config.after_blur_delay_ms,
                saved_status_display_ms: config.saved_status_display_ms,
                error_status_display_ms: config.error_status_display_ms,
                retry_delay_ms: config.retry_delay_ms,
                throttle_save_ms: config.throttle_save_ms,
                periodic_save_ms: config.periodic_save_ms,
                significant_change_chars: config.significant_change_chars,
                large_paste_chars: config.large_paste_chars,
                typing_speed_ms: config.typing_speed_ms,
                recovery_window_days: config.recovery_window_days,
            },
            scroll_sync: ScrollSyncConfig {
                enabled: config.sync_enabled,
                quiescence_ms: config.quiescence_ms,
                pointer_quiescence_ms: config.pointer_quiescence_ms,
                jitter_threshold_px: config.jitter_threshold_px,
                scroll_to_element_ms: config.scroll_to_element_ms,
            },
            editor: EditorTable {
                render_debounce_ms: config.render_debounce_ms,
                reading_wpm: config.reading_wpm,
            },
            storage: StorageConfig {
                storage_dir: config.storage_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AutosaveConfig {
    #[serde(default = "defaults::default_typing_fast_delay_ms")]
    typing_fast_delay_ms: u64,
    #[serde(default = "defaults::default_typing_slow_delay_ms")]
    typing_slow_delay_ms: u64,
    #[serde(default = "defaults::default_idle_delay_ms")]
    idle_delay_ms: u64,
    #[serde(default = "defaults::default_after_blur_delay_ms")]
    after_blur_delay_ms: u64,
    #[serde(default = "defaults::default_saved_status_display_ms")]
    saved_status_display_ms: u64,
    #[serde(default = "defaults::default_error_status_display_ms")]
    error_status_display_ms: u64,
    #[serde(default = "defaults::default_retry_delay_ms")]
    retry_delay_ms: u64,
    #[serde(default = "defaults::default_throttle_save_ms")]
    throttle_save_ms: u64,
    #[serde(default = "defaults::default_periodic_save_ms")]
    periodic_save_ms: u64,
    #[serde(default = "defaults::default_significant_change_chars")]
    significant_change_chars: usize,
    #[serde(default = "defaults::default_large_paste_chars")]
    large_paste_chars: usize,
    #[serde(default = "defaults::default_typing_speed_ms")]
    typing_speed_ms: u64,
    #[serde(default = "defaults::default_recovery_window_days")]
    recovery_window_days: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        AutosaveConfig {
            typing_fast_delay_ms: defaults::default_typing_fast_delay_ms(),
            typing_slow_delay_ms: defaults::default_typing_slow_delay_ms(),
            idle_delay_ms: defaults::default_idle_delay_ms(),
            after_blur_delay_ms: defaults::default_after_blur_delay_ms(),
            saved_status_display_ms: defaults::default_saved_status_display_ms(),
            error_status_display_ms: defaults::default_error_status_display_ms(),
            retry_delay_ms: defaults::default_retry_delay_ms(),
            throttle_save_ms: defaults::default_throttle_save_ms(),
            periodic_save_ms: defaults::default_periodic_save_ms(),
            significant_change_chars: defaults::default_significant_change_chars(),
            large_paste_chars: defaults::default_large_paste_chars(),
            typing_speed_ms: defaults::default_typing_speed_ms(),
            recovery_window_days: defaults::default_recovery_window_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ScrollSyncConfig {
    #[serde(default = "defaults::default_sync_enabled")]
    enabled: bool,
    #[serde(default = "defaults::default_quiescence_ms")]
    quiescence_ms: u64,
    #[serde(default = "defaults::default_pointer_quiescence_ms")]
    pointer_quiescence_ms: u64,
    #[serde(default = "defaults::default_jitter_threshold_px")]
    jitter_threshold_px: f64,
    #[serde(default = "defaults::default_scroll_to_element_ms")]
    scroll_to_element_ms: u64,
}

impl Default for ScrollSyncConfig {
    fn default() -> Self {
        ScrollSyncConfig {
            enabled: defaults::default_sync_enabled(),
            quiescence_ms: defaults::default_quiescence_ms(),
            pointer_quiescence_ms: defaults::default_pointer_quiescence_ms(),
            jitter_threshold_px: defaults::default_jitter_threshold_px(),
            scroll_to_element_ms: defaults::default_scroll_to_element_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct EditorTable {
    #[serde(default = "defaults::default_render_debounce_ms")]
    render_debounce_ms: u64,
    #[serde(default = "defaults::default_reading_wpm")]
    reading_wpm: usize,
}

impl Default for EditorTable {
    fn default() -> Self {
        EditorTable {
            render_debounce_ms: defaults::default_render_debounce_ms(),
            reading_wpm: defaults::default_reading_wpm(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_storage_dir")]
    storage_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            storage_dir: defaults::default_storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
