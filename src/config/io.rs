use super::models::EditorConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the configuration file, falling back to defaults on any problem so
/// the editor can always start.
pub fn load_config(path: &Path) -> EditorConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return EditorConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            EditorConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<EditorConfig> {
    let tables: ConfigTables =
        toml::from_str(contents).context("failed to parse sectioned config tables")?;
    Ok(tables.into())
}

pub fn serialize_config(config: &EditorConfig) -> Result<String> {
    let tables = ConfigTables::from(config);
    toml::to_string_pretty(&tables).context("failed to serialize config tables")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("empty config parses");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.large_paste_chars, 100);
        assert_eq!(config.quiescence_ms, 150);
    }

    #[test]
    fn sectioned_tables_override_individual_fields() {
        let contents = r#"
[autosave]
large_paste_chars = 250
idle_delay_ms = 4000

[scroll_sync]
enabled = false
pointer_quiescence_ms = 450

[logging]
log_level = "trace"
"#;
        let config = parse_config(contents).expect("config parses");
        assert_eq!(config.large_paste_chars, 250);
        assert_eq!(config.idle_delay_ms, 4_000);
        assert_eq!(config.typing_fast_delay_ms, 500);
        assert!(!config.sync_enabled);
        assert_eq!(config.pointer_quiescence_ms, 450);
        assert_eq!(config.log_level, LogLevel::Trace);
    }

    #[test]
    fn serialized_config_parses_back_to_the_same_values() {
        let mut config = EditorConfig::default();
        config.retry_delay_ms = 2_500;
        config.storage_dir = "/tmp/markpad".to_string();
        let text = serialize_config(&config).expect("serialize");
        assert!(text.contains("[autosave]"));
        assert_eq!(parse_config(&text).expect("parse"), config);
    }

    #[test]
    fn invalid_toml_is_an_error_and_missing_file_falls_back() {
        assert!(parse_config("autosave = [").is_err());
        let config = load_config(Path::new("/nonexistent/markpad/config.toml"));
        assert_eq!(config, EditorConfig::default());
    }
}
