//! Configuration.
//!
//! Handles loading, validating and merging a `config.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! debounce_ms = 0          # 0 = re-encode as soon as the worker frees up
//! cache_entries = 32       # encoded previews kept in memory (0 = off)
//!
//! [quality]
//! initial_compression = 0  # slider position (percent) for a new session
//!
//! [save]
//! suffix = "_compressed"   # default output name: <stem><suffix>.jpg
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for the debounce delay; anything longer feels broken.
const MAX_DEBOUNCE_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Live preview scheduling and caching.
    pub preview: PreviewConfig,
    /// Starting slider position.
    pub quality: QualityConfig,
    /// Save naming.
    pub save: SaveConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality.initial_compression > 100 {
            return Err(ConfigError::Validation(
                "quality.initial_compression must be 0-100".into(),
            ));
        }
        if self.preview.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "preview.debounce_ms must be at most {}",
                MAX_DEBOUNCE_MS
            )));
        }
        if self.save.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "save.suffix must not be empty".into(),
            ));
        }
        if self.save.suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "save.suffix must not contain path separators".into(),
            ));
        }
        Ok(())
    }
}

/// Live preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Delay before a quality change is sent to the encoder, in milliseconds.
    /// With 0, a change made while an encode runs is picked up the moment that
    /// encode finishes.
    pub debounce_ms: u64,
    /// Number of encoded previews kept in memory. 0 disables caching.
    pub cache_entries: usize,
}

impl PreviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            cache_entries: 32,
        }
    }
}

/// Starting slider position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// Compression percent a new session starts at (0 = best quality).
    pub initial_compression: u8,
}

impl QualityConfig {
    pub fn initial_quality(&self) -> Quality {
        Quality::from_compression_percent(self.initial_compression as f64)
    }
}

/// Save naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    /// Appended to the source stem to build the default output name.
    pub suffix: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            suffix: "_compressed".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` file.
///
/// `None` yields the stock defaults. A path that does not exist is an error:
/// the user asked for that file explicitly.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# img-compressor configuration
# ===========================
# All options are optional. Values shown are the defaults.

[preview]
# Delay (milliseconds) before a slider change is encoded. With 0, a change
# made while an encode is running is encoded as soon as that one finishes,
# and intermediate positions are skipped. Maximum 1000.
debounce_ms = 0

# Number of encoded previews kept in memory, so returning to a slider
# position is instant. 0 disables the cache.
cache_entries = 32

[quality]
# Slider position a new session starts at, as a compression percent:
# 0 keeps the best quality, 100 compresses as much as possible.
initial_compression = 0

[save]
# Suffix for the default output file name: <stem><suffix>.jpg
suffix = "_compressed"
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn load_without_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), Config::default());
    }

    #[test]
    fn sparse_file_overrides_only_given_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[preview]\ndebounce_ms = 40\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.preview.debounce_ms, 40);
        assert_eq!(config.preview.cache_entries, 32);
        assert_eq!(config.save.suffix, "_compressed");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let overlay: toml::Value = toml::from_str("[preview]\ndebounce = 40\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[preview\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)).unwrap_err(),
            ConfigError::Toml(_)
        ));
    }

    #[test]
    fn compression_above_100_is_rejected() {
        let overlay: toml::Value = toml::from_str("[quality]\ninitial_compression = 120\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn long_debounce_is_rejected() {
        let mut config = Config::default();
        config.preview.debounce_ms = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn suffix_with_separator_is_rejected() {
        let mut config = Config::default();
        config.save.suffix = "/../evil".into();
        assert!(config.validate().is_err());
        config.save.suffix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn initial_quality_follows_slider_mapping() {
        let config = QualityConfig {
            initial_compression: 40,
        };
        assert_eq!(config.initial_quality().compression_percent(), 40);
        assert_eq!(QualityConfig::default().initial_quality(), Quality::MAX);
    }
}
