//! Conversation controller — top-level coordination glue.
//!
//! Owns the selected conversation id, the materialized message list and
//! the conversation summaries, plus the single [`ChatSessionManager`].
//! After every terminal session state both the summary list and the
//! active history are re-synced from the store; refresh failures leave
//! stale data in place rather than surfacing an error.

use crate::events::ChatEventBus;
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::inference::InferenceGateway;
use crate::use_cases::chat_session::{
    ChatSessionManager, SendMessageInput, SessionError, SessionOutcome,
};
use braid_domain::{Conversation, Message};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct ConversationController {
    store: Arc<dyn ConversationStore>,
    session: ChatSessionManager,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    messages: Vec<Message>,
}

impl ConversationController {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<dyn InferenceGateway>,
        bus: Arc<ChatEventBus>,
    ) -> Self {
        let session = ChatSessionManager::new(store.clone(), gateway, bus);
        Self {
            store,
            session,
            conversations: Vec::new(),
            active_id: None,
            messages: Vec::new(),
        }
    }

    /// Reload the summary list. Failures keep the stale list.
    pub async fn refresh_conversations(&mut self) {
        match self.store.list_conversations().await {
            Ok(conversations) => self.conversations = conversations,
            Err(e) => warn!(error = %e, "conversation list refresh failed"),
        }
    }

    /// Make `id` the active conversation and load its persisted history,
    /// replacing any local session remnants.
    pub async fn select_conversation(&mut self, id: &str) -> Result<(), StoreError> {
        let messages = self.store.get_messages(id).await?;
        self.active_id = Some(id.to_string());
        self.messages = messages;
        Ok(())
    }

    /// Start a fresh thread: clears the active id and history without
    /// contacting the store. The conversation record is created lazily
    /// on the first submission.
    pub fn start_new(&mut self) {
        self.active_id = None;
        self.messages.clear();
    }

    /// Delete a conversation (cascades to messages). Deleting the
    /// active conversation behaves like [`Self::start_new`].
    pub async fn delete_conversation(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.delete_conversation(id).await?;
        if self.active_id.as_deref() == Some(id) {
            self.start_new();
        }
        self.refresh_conversations().await;
        Ok(())
    }

    /// Run one streaming session for the active conversation (creating
    /// one if none is active), then re-sync summaries and history.
    pub async fn send(
        &mut self,
        input: &str,
        model: &str,
        cancel: CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let outcome = self
            .session
            .submit(
                SendMessageInput {
                    input: input.to_string(),
                    model: model.to_string(),
                    conversation_id: self.active_id.clone(),
                },
                cancel,
            )
            .await?;

        self.active_id = Some(outcome.conversation_id.clone());
        self.messages = outcome.messages.clone();
        self.refresh_conversations().await;
        Ok(outcome)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::inference::{ChatRequest, InferenceError, PullProgress};
    use async_trait::async_trait;
    use braid_domain::{ModelDescriptor, Role, StreamEvent};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        conversations: Mutex<Vec<Conversation>>,
        messages: Mutex<HashMap<String, Vec<Message>>>,
        fail_lists: AtomicBool,
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
            if self.fail_lists.load(Ordering::Relaxed) {
                return Err(StoreError::Persistence("io error".to_string()));
            }
            let mut conversations = self.conversations.lock().unwrap().clone();
            conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(conversations)
        }

        async fn create_conversation(
            &self,
            title: &str,
            model: &str,
        ) -> Result<Conversation, StoreError> {
            let now = Utc::now();
            let conversation = Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                title: title.to_string(),
                model: model.to_string(),
                created_at: now,
                updated_at: now,
            };
            self.conversations.lock().unwrap().push(conversation.clone());
            self.messages
                .lock()
                .unwrap()
                .insert(conversation.id.clone(), Vec::new());
            Ok(conversation)
        }

        async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
            self.messages
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))
        }

        async fn save_message(
            &self,
            conversation_id: &str,
            role: Role,
            content: &str,
        ) -> Result<Message, StoreError> {
            let message = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                role,
                content: content.to_string(),
                created_at: Utc::now(),
            };
            self.messages
                .lock()
                .unwrap()
                .get_mut(conversation_id)
                .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))?
                .push(message.clone());
            Ok(message)
        }

        async fn delete_conversation(&self, id: &str) -> Result<(), StoreError> {
            self.conversations.lock().unwrap().retain(|c| c.id != id);
            self.messages.lock().unwrap().remove(id);
            Ok(())
        }
    }

    /// Gateway that echoes a canned reply through the bus.
    struct EchoGateway {
        bus: Arc<ChatEventBus>,
        reply: String,
    }

    #[async_trait]
    impl InferenceGateway for EchoGateway {
        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, InferenceError> {
            Ok(vec![])
        }

        async fn stream_chat(&self, request: ChatRequest) -> Result<(), InferenceError> {
            self.bus.publish(StreamEvent::Token {
                conversation_id: request.conversation_id.clone(),
                token: self.reply.clone(),
            });
            self.bus.publish(StreamEvent::Done {
                conversation_id: request.conversation_id,
            });
            Ok(())
        }

        async fn pull_model(
            &self,
            _name: &str,
            _on_progress: &(dyn Fn(PullProgress) + Send + Sync),
        ) -> Result<(), InferenceError> {
            Ok(())
        }

        async fn delete_model(&self, _name: &str) -> Result<(), InferenceError> {
            Ok(())
        }
    }

    fn controller_with(reply: &str) -> (ConversationController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(ChatEventBus::new());
        let gateway = Arc::new(EchoGateway {
            bus: bus.clone(),
            reply: reply.to_string(),
        });
        (
            ConversationController::new(store.clone(), gateway, bus),
            store,
        )
    }

    #[tokio::test]
    async fn send_creates_and_activates_a_conversation() {
        let (mut controller, _store) = controller_with("Hi!");
        assert_eq!(controller.active_id(), None);

        let outcome = controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(controller.active_id(), Some(outcome.conversation_id.as_str()));
        // History re-synced: user turn + echoed assistant turn
        assert_eq!(controller.messages().len(), 2);
        assert_eq!(controller.conversations().len(), 1);
    }

    #[tokio::test]
    async fn start_new_clears_state_without_store_contact() {
        let (mut controller, store) = controller_with("Hi!");
        controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();

        controller.start_new();
        assert_eq!(controller.active_id(), None);
        assert!(controller.messages().is_empty());
        // The persisted conversation is untouched
        assert_eq!(store.conversations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_active_conversation_behaves_as_start_new() {
        let (mut controller, _store) = controller_with("Hi!");
        let outcome = controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();
        let id = outcome.conversation_id;

        controller.delete_conversation(&id).await.unwrap();
        assert_eq!(controller.active_id(), None);
        assert!(controller.messages().is_empty());
        assert!(controller.conversations().is_empty());
    }

    #[tokio::test]
    async fn deleting_inactive_conversation_keeps_selection() {
        let (mut controller, store) = controller_with("Hi!");
        let other = store.create_conversation("Other", "llama3").await.unwrap();
        let outcome = controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();

        controller.delete_conversation(&other.id).await.unwrap();
        assert_eq!(controller.active_id(), Some(outcome.conversation_id.as_str()));
        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn select_conversation_loads_persisted_history() {
        let (mut controller, store) = controller_with("Hi!");
        let conversation = store.create_conversation("Old", "llama3").await.unwrap();
        store
            .save_message(&conversation.id, Role::User, "old question")
            .await
            .unwrap();

        controller.select_conversation(&conversation.id).await.unwrap();
        assert_eq!(controller.active_id(), Some(conversation.id.as_str()));
        assert_eq!(controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn selecting_unknown_conversation_is_not_found() {
        let (mut controller, _store) = controller_with("Hi!");
        let result = controller.select_conversation("nope").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        // Selection unchanged
        assert_eq!(controller.active_id(), None);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_stale_list() {
        let (mut controller, store) = controller_with("Hi!");
        controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(controller.conversations().len(), 1);

        store.fail_lists.store(true, Ordering::Relaxed);
        controller.refresh_conversations().await;
        // Stale data preferred over crashing
        assert_eq!(controller.conversations().len(), 1);
    }

    #[tokio::test]
    async fn second_send_continues_the_active_conversation() {
        let (mut controller, store) = controller_with("Hi!");
        let first = controller
            .send("Hello", "llama3", CancellationToken::new())
            .await
            .unwrap();
        let second = controller
            .send("Again", "llama3", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);
        assert_eq!(store.conversations.lock().unwrap().len(), 1);
        assert_eq!(controller.messages().len(), 4);
    }
}
