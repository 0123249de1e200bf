//! Model catalog — discovery and the default-selection policy.
//!
//! The catalog is a read-only snapshot refreshed on demand. Default
//! selection runs exactly once per process lifetime, on the first
//! successful refresh; the one-shot is an explicit flag owned here, not
//! ambient state. Later refreshes never override an existing selection.

use crate::ports::inference::{InferenceError, InferenceGateway, PullProgress};
use crate::ports::preferences::ModelPreferences;
use braid_domain::ModelDescriptor;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ModelCatalog {
    gateway: Arc<dyn InferenceGateway>,
    preferences: Arc<dyn ModelPreferences>,
    /// Preference read once at startup.
    remembered: Option<String>,
    models: Vec<ModelDescriptor>,
    selected: Option<String>,
    default_applied: bool,
}

impl ModelCatalog {
    /// Reads the remembered model preference once, up front.
    pub async fn new(
        gateway: Arc<dyn InferenceGateway>,
        preferences: Arc<dyn ModelPreferences>,
    ) -> Self {
        let remembered = preferences.load().await;
        if let Some(ref name) = remembered {
            debug!(model = %name, "remembered model preference");
        }
        Self {
            gateway,
            preferences,
            remembered,
            models: Vec::new(),
            selected: None,
            default_applied: false,
        }
    }

    /// Reload the catalog from the backend.
    ///
    /// On the first successful load only: select the remembered model if
    /// it is present in the catalog, otherwise the first entry (in
    /// backend order) when nothing is selected yet.
    pub async fn refresh(&mut self) -> Result<&[ModelDescriptor], InferenceError> {
        self.models = self.gateway.list_models().await?;

        if !self.default_applied {
            self.default_applied = true;
            let remembered = self
                .remembered
                .clone()
                .filter(|name| self.models.iter().any(|m| &m.name == name));
            if let Some(name) = remembered {
                info!(model = %name, "selected remembered model");
                self.selected = Some(name);
            } else if self.selected.is_none() {
                if let Some(first) = self.models.first() {
                    self.selected = Some(first.name.clone());
                    info!(model = %first.name, "selected first available model");
                }
            }
        }

        Ok(&self.models)
    }

    /// Select a model and remember it for the next start.
    ///
    /// A failed preference write keeps the selection; staleness of the
    /// remembered name is tolerated.
    pub async fn select(&mut self, name: &str) {
        self.selected = Some(name.to_string());
        if let Err(e) = self.preferences.store(name).await {
            warn!(model = %name, error = %e, "failed to persist model preference");
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Download a model onto the backend.
    pub async fn pull(
        &self,
        name: &str,
        on_progress: &(dyn Fn(PullProgress) + Send + Sync),
    ) -> Result<(), InferenceError> {
        self.gateway.pull_model(name, on_progress).await
    }

    /// Remove a model from the backend.
    pub async fn remove(&self, name: &str) -> Result<(), InferenceError> {
        self.gateway.delete_model(name).await
    }
}
