//! Conversation store port
//!
//! CRUD facade over persisted conversations and messages. The store —
//! not client memory — is the source of truth for message ordering and
//! for history replayed to the inference backend.

use async_trait::async_trait;
use braid_domain::{Conversation, Message, Role};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The referenced conversation does not exist (e.g. deleted by a
    /// concurrent action).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage read/write failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Persistence facade for conversations and messages
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All conversations, most-recently-updated first. The order is
    /// store-defined; callers must not re-sort.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError>;

    /// Allocate a new conversation bound to `model`.
    async fn create_conversation(
        &self,
        title: &str,
        model: &str,
    ) -> Result<Conversation, StoreError>;

    /// Messages of one conversation in creation order. Empty vec for a
    /// conversation with no messages; `NotFound` for an unknown id.
    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Append a message. Bumps the conversation's `updated_at`.
    /// `NotFound` if the conversation no longer exists.
    async fn save_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Delete a conversation and its messages. Idempotent: deleting an
    /// absent id is a no-op, tolerating racing deletes.
    async fn delete_conversation(&self, id: &str) -> Result<(), StoreError>;
}
