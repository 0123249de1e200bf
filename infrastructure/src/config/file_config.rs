//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file
//! and are deserialized directly.

use crate::ollama::gateway::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Inference backend settings
    pub ollama: FileOllamaConfig,
    /// Conversation storage settings
    pub storage: FileStorageConfig,
    /// Telemetry polling settings
    pub telemetry: FileTelemetryConfig,
}

/// `[ollama]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    /// Base URL of the Ollama HTTP API
    pub base_url: String,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Path to the SQLite database; defaults to the user data directory
    pub db_path: Option<PathBuf>,
}

impl FileStorageConfig {
    /// The configured path, or `<data dir>/braid/braid.db`.
    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("braid").join("braid.db"))
        })
    }
}

/// `[telemetry]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTelemetryConfig {
    /// Seconds between telemetry samples
    pub interval_seconds: u64,
}

impl Default for FileTelemetryConfig {
    fn default() -> Self {
        Self { interval_seconds: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_ollama() {
        let config = FileConfig::default();
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.telemetry.interval_seconds, 5);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            [ollama]
            base_url = "http://remote:11434"
            "#,
        )
        .unwrap();
        assert_eq!(config.ollama.base_url, "http://remote:11434");
        assert_eq!(config.telemetry.interval_seconds, 5);
    }

    #[test]
    fn explicit_db_path_wins_over_default_location() {
        let storage = FileStorageConfig {
            db_path: Some(PathBuf::from("/tmp/test.db")),
        };
        assert_eq!(storage.resolved_db_path(), Some(PathBuf::from("/tmp/test.db")));
    }
}
