//! Model preference port
//!
//! Locally remembered last-selected model name, persisted across
//! process restarts under a fixed key. Read once at startup, written on
//! every successful model selection.

use super::conversation_store::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait ModelPreferences: Send + Sync {
    /// The remembered model name, if any.
    async fn load(&self) -> Option<String>;

    /// Remember `name` as the selected model.
    async fn store(&self, name: &str) -> Result<(), StoreError>;
}
