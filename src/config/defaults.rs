pub(crate) fn default_typing_fast_delay_ms() -> u64 {
    500
}

pub(crate) fn default_typing_slow_delay_ms() -> u64 {
    1_500
}

pub(crate) fn default_idle_delay_ms() -> u64 {
    3_000
}

pub(crate) fn default_after_blur_delay_ms() -> u64 {
    100
}

pub(crate) fn default_saved_status_display_ms() -> u64 {
    2_000
}

pub(crate) fn default_error_status_display_ms() -> u64 {
    5_000
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    1_000
}

pub(crate) fn default_throttle_save_ms() -> u64 {
    1_000
}

pub(crate) fn default_periodic_save_ms() -> u64 {
    30_000
}

pub(crate) fn default_significant_change_chars() -> usize {
    20
}

pub(crate) fn default_large_paste_chars() -> usize {
    100
}

pub(crate) fn default_typing_speed_ms() -> u64 {
    2_000
}

pub(crate) fn default_recovery_window_days() -> u64 {
    7
}

pub(crate) fn default_sync_enabled() -> bool {
    true
}

pub(crate) fn default_quiescence_ms() -> u64 {
    150
}

pub(crate) fn default_pointer_quiescence_ms() -> u64 {
    300
}

pub(crate) fn default_jitter_threshold_px() -> f64 {
    1.0
}

pub(crate) fn default_scroll_to_element_ms() -> u64 {
    800
}

pub(crate) fn default_render_debounce_ms() -> u64 {
    300
}

pub(crate) fn default_reading_wpm() -> usize {
    225
}

pub(crate) fn default_storage_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
