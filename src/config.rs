//! Configuration module for chipfield
//!
//! Controller defaults can be tuned without code changes. Settings are read
//! from `<config dir>/chipfield/config.toml` when present and can be
//! overridden with `CHIPFIELD_*` environment variables, e.g.
//! `CHIPFIELD_DEBOUNCE_MS=150`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Controller configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ChipsConfig {
    /// Quiet window before a typed query is looked up
    pub debounce_ms: u64,

    /// Text shown while there are no chips
    pub placeholder: String,

    /// Never show the suggestion overlay (suggestions are still computed)
    pub hide_suggestion_overlay: bool,

    /// When false, chip mutations are no-ops
    pub enabled: bool,

    /// Look up suggestions automatically whenever the query changes
    pub auto_load: bool,
}

impl Default for ChipsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            placeholder: String::new(),
            hide_suggestion_overlay: false,
            enabled: true,
            auto_load: true,
        }
    }
}

impl ChipsConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("chipfield").join("config.toml"))
    }

    /// Load configuration from the user config file and environment
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment holds invalid values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        Config::builder()
            .add_source(File::from(config_path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("CHIPFIELD").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a specific TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the string is not valid configuration.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Render the configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))
    }

    /// The debounce window as a `Duration`
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ChipsConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert!(config.enabled);
        assert!(config.auto_load);
        assert!(!config.hide_suggestion_overlay);
        assert!(config.placeholder.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ChipsConfig::from_toml_str(
            r#"
            debounce_ms = 120
            placeholder = "Add a tag"
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce_ms, 120);
        assert_eq!(config.placeholder, "Add a tag");
        assert!(config.enabled);
        assert!(config.auto_load);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let result = ChipsConfig::from_toml_str("debounce_ms = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_round_trips_written_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let written = ChipsConfig {
            debounce_ms: 50,
            hide_suggestion_overlay: true,
            ..ChipsConfig::default()
        };
        fs::write(&path, written.to_toml_string().unwrap()).unwrap();

        assert_eq!(ChipsConfig::load_from(&path).unwrap(), written);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(ChipsConfig::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
