//! File-backed model preference.
//!
//! A tiny TOML file under the user config directory remembering the
//! last selected model. A missing or unreadable file simply means no
//! preference.

use async_trait::async_trait;
use braid_application::{ModelPreferences, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    selected_model: Option<String>,
}

pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preference file at the conventional location,
    /// `<config dir>/braid/preferences.toml`.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("braid").join("preferences.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> PreferencesFile {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return PreferencesFile::default();
        };
        toml::from_str(&raw).unwrap_or_default()
    }

    fn write(&self, prefs: &PreferencesFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Persistence(e.to_string()))?;
        }
        let raw = toml::to_string_pretty(prefs)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| StoreError::Persistence(e.to_string()))
    }
}

#[async_trait]
impl ModelPreferences for FilePreferences {
    async fn load(&self) -> Option<String> {
        let selected = self.read().selected_model;
        debug!(selected = ?selected, "loaded model preference");
        selected
    }

    async fn store(&self, name: &str) -> Result<(), StoreError> {
        self.write(&PreferencesFile {
            selected_model: Some(name.to_string()),
        })
    }
}
