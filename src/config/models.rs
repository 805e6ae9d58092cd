use serde::Deserialize;

/// Flat editor configuration; every tuning constant of the autosave and
/// scroll-sync engines lives here rather than in code.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct EditorConfig {
    #[serde(default = "crate::config::defaults::default_typing_fast_delay_ms")]
    pub typing_fast_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_typing_slow_delay_ms")]
    pub typing_slow_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_after_blur_delay_ms")]
    pub after_blur_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_saved_status_display_ms")]
    pub saved_status_display_ms: u64,
    #[serde(default = "crate::config::defaults::default_error_status_display_ms")]
    pub error_status_display_ms: u64,
    #[serde(default = "crate::config::defaults::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_throttle_save_ms")]
    pub throttle_save_ms: u64,
    #[serde(default = "crate::config::defaults::default_periodic_save_ms")]
    pub periodic_save_ms: u64,
    #[serde(default = "crate::config::defaults::default_significant_change_chars")]
    pub significant_change_chars: usize,
    #[serde(default = "crate::config::defaults::default_large_paste_chars")]
    pub large_paste_chars: usize,
    #[serde(default = "crate::config::defaults::default_typing_speed_ms")]
    pub typing_speed_ms: u64,
    #[serde(default = "crate::config::defaults::default_recovery_window_days")]
    pub recovery_window_days: u64,
    #[serde(default = "crate::config::defaults::default_sync_enabled")]
    pub sync_enabled: bool,
    #[serde(default = "crate::config::defaults::default_quiescence_ms")]
    pub quiescence_ms: u64,
    #[serde(default = "crate::config::defaults::default_pointer_quiescence_ms")]
    pub pointer_quiescence_ms: u64,
    #[serde(default = "crate::config::defaults::default_jitter_threshold_px")]
    pub jitter_threshold_px: f64,
    #[serde(default = "crate::config::defaults::default_scroll_to_element_ms")]
    pub scroll_to_element_ms: u64,
    #[serde(default = "crate::config::defaults::default_render_debounce_ms")]
    pub render_debounce_ms: u64,
    #[serde(default = "crate::config::defaults::default_reading_wpm")]
    pub reading_wpm: usize,
    #[serde(default = "crate::config::defaults::default_storage_dir")]
    pub storage_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            typing_fast_delay_ms: crate::config::defaults::default_typing_fast_delay_ms(),
            typing_slow_delay_ms: crate::config::defaults::default_typing_slow_delay_ms(),
            idle_delay_ms: crate::config::defaults::default_idle_delay_ms(),
            after_blur_delay_ms: crate::config::defaults::default_after_blur_delay_ms(),
            saved_status_display_ms: crate::config::defaults::default_saved_status_display_ms(),
            error_status_display_ms: crate::config::defaults::default_error_status_display_ms(),
            retry_delay_ms: crate::config::defaults::default_retry_delay_ms(),
            throttle_save_ms: crate::config::defaults::default_throttle_save_ms(),
            periodic_save_ms: crate::config::defaults::default_periodic_save_ms(),
            significant_change_chars: crate::config::defaults::default_significant_change_chars(),
            large_paste_chars: crate::config::defaults::default_large_paste_chars(),
            typing_speed_ms: crate::config::defaults::default_typing_speed_ms(),
            recovery_window_days: crate::config::defaults::default_recovery_window_days(),
            sync_enabled: crate::config::defaults::default_sync_enabled(),
            quiescence_ms: crate::config::defaults::default_quiescence_ms(),
            pointer_quiescence_ms: crate::config::defaults::default_pointer_quiescence_ms(),
            jitter_threshold_px: crate::config::defaults::default_jitter_threshold_px(),
            scroll_to_element_ms: crate::config::defaults::default_scroll_to_element_ms(),
            render_debounce_ms: crate::config::defaults::default_render_debounce_ms(),
            reading_wpm: crate::config::defaults::default_reading_wpm(),
            storage_dir: crate::config::defaults::default_storage_dir(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
