//! Inference gateway port
//!
//! Defines the interface for communicating with the inference backend.

use async_trait::async_trait;
use braid_domain::{ModelDescriptor, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The inference service cannot be reached at all.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The service was reached but the transport failed mid-call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service rejected the request (non-success status).
    #[error("Backend rejected request: {0}")]
    Rejected(String),
}

/// One role/content pair of replayed history.
///
/// Serializes to the `{ "role": "...", "content": "..." }` shape the
/// backend wire protocol expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A start-stream request carrying the full ordered history.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub history: Vec<ChatTurn>,
    pub conversation_id: String,
}

/// Progress of a model download.
#[derive(Debug, Clone)]
pub struct PullProgress {
    pub status: String,
    pub completed: Option<u64>,
    pub total: Option<u64>,
}

/// Gateway to the inference backend
///
/// `stream_chat` drives one whole generation: it publishes zero or more
/// `StreamEvent::Token`s followed by exactly one `StreamEvent::Done` to
/// the event bus it was constructed with, scoped by the request's
/// conversation id. A transport-level rejection is returned as `Err`
/// instead of a terminal event; callers treat both identically.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Models installed on the backend. `Unavailable` if the service is
    /// unreachable; an empty vec if reachable but bare.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, InferenceError>;

    /// Start one streamed generation and drive it to its terminal event.
    async fn stream_chat(&self, request: ChatRequest) -> Result<(), InferenceError>;

    /// Download a model, reporting progress through `on_progress`.
    async fn pull_model(
        &self,
        name: &str,
        on_progress: &(dyn Fn(PullProgress) + Send + Sync),
    ) -> Result<(), InferenceError>;

    /// Remove a model from the backend.
    async fn delete_model(&self, name: &str) -> Result<(), InferenceError>;
}
