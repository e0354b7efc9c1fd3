//! Application configuration, read from TOML.
//!
//! ```toml
//! default_language = "es"
//!
//! [storage]
//! path = "diagnovet.db"   # omit for an in-memory store
//!
//! [images]
//! allowed_media_types = ["image/png", "image/jpeg", "application/pdf"]
//! max_file_mb = 20
//!
//! [assistant]
//! delay_ms = 3000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::preferences::Language;
use crate::store::{KeyValueStore, MemoryStore, SqliteStore, StoreResult};
use crate::validation::ImagePolicy;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the key-value store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; `None` keeps everything in memory
    pub path: Option<PathBuf>,
}

/// Diagnostic assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    /// Delay before the draft appears, in milliseconds
    pub delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self { delay_ms: 3000 }
    }
}

impl AssistantConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Language used until the user picks one
    pub default_language: Language,
    pub storage: StorageConfig,
    pub images: ImagePolicy,
    pub assistant: AssistantConfig,
}

impl AppConfig {
    /// Parse configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Open the configured store.
    pub fn open_store(&self) -> StoreResult<Box<dyn KeyValueStore + Send>> {
        match &self.storage.path {
            Some(path) => {
                info!(path = %path.display(), "Opening SQLite store");
                Ok(Box::new(SqliteStore::open(path)?))
            }
            None => Ok(Box::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.default_language, Language::Es);
        assert_eq!(config.assistant.delay(), Duration::from_secs(3));
        assert_eq!(config.images.max_file_mb, 20);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            default_language = "en"

            [images]
            max_file_mb = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.images.max_file_mb, 5);
        assert_eq!(config.images.allowed_media_types.len(), 3);
        assert_eq!(config.assistant.delay_ms, 3000);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("default_language = \"fr\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_file_and_open_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("diagnovet.db");
        let config_path = dir.path().join("diagnovet.toml");
        std::fs::write(
            &config_path,
            format!("[storage]\npath = {:?}\n", db_path.to_string_lossy()),
        )
        .unwrap();

        let config = AppConfig::load(&config_path).unwrap();
        assert_eq!(config.storage.path.as_deref(), Some(db_path.as_path()));

        let mut store = config.open_store().unwrap();
        store.set("appLanguage", "en").unwrap();
        assert!(db_path.exists());
    }
}
