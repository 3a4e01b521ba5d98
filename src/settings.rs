//! Persisted user settings for the CLI.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::agent::DEFAULT_MAX_STEPS;
use crate::model::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Settings persistence errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot determine config directory")]
    NoConfigDir,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid settings file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings that can be saved and loaded. The API key is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Path to the adb executable (empty = discover)
    pub adb_path: String,
    /// ADB device serial (empty = any single device)
    pub serial: String,
    /// Messages API base URL
    pub base_url: String,
    /// Model name
    pub model_name: String,
    /// Maximum output tokens per oracle call
    pub max_tokens: u32,
    /// Maximum retries for model requests
    pub max_retries: u32,
    /// Retry delay in seconds
    pub retry_delay: u64,
    /// Maximum steps for agent
    pub max_steps: u32,
    /// Screenshots kept in requests (None = all)
    pub keep_screenshots: Option<usize>,
    /// Offer every device action instead of the agent menu
    pub full_tools: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            serial: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: 3,
            retry_delay: 2,
            max_steps: DEFAULT_MAX_STEPS,
            keep_screenshots: None,
            full_tools: false,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "adb-agent", "adb-agent")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, or defaults when there is none.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut loaded: Self =
            serde_json::from_str(&content).map_err(|source| SettingsError::Format {
                path: path.to_path_buf(),
                source,
            })?;

        // Backfill blanks written by older versions
        let defaults = Self::default();
        if loaded.base_url.is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.model_name.is_empty() {
            loaded.model_name = defaults.model_name;
        }
        if loaded.max_tokens == 0 {
            loaded.max_tokens = defaults.max_tokens;
        }

        Ok(loaded)
    }

    /// Save settings to the config file and return its path.
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    /// Blank strings mean "not set".
    pub fn adb_path(&self) -> Option<&str> {
        non_empty(&self.adb_path)
    }

    pub fn serial(&self) -> Option<&str> {
        non_empty(&self.serial)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.max_steps, 25);
        assert_eq!(settings.model_name, "claude-sonnet-4-5-20250929");
        assert!(settings.serial().is_none());
        assert!(settings.adb_path().is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = AppSettings {
            serial: "emulator-5554".to_string(),
            max_steps: 40,
            keep_screenshots: Some(3),
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.serial(), Some("emulator-5554"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("api_key"));
    }

    #[test]
    fn test_partial_file_backfills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"model_name": "", "max_steps": 10}"#).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded.max_steps, 10);
        assert_eq!(loaded.model_name, DEFAULT_MODEL);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(SettingsError::Format { .. })
        ));
    }
}
