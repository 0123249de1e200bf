//! Streaming chat session — the state machine driving one
//! "send message → stream tokens → persist → reconcile" cycle.
//!
//! States: `Idle → Submitting → Streaming → Finalizing →
//! {Completed | Cancelled | Failed}`.
//!
//! Ordering contracts enforced here:
//!
//! - The user's turn is persisted **before** streaming starts, so a
//!   crash mid-stream never loses it.
//! - History replayed to the backend is reloaded from the store, never
//!   taken from client memory.
//! - The subscription is registered before the stream task starts and
//!   dropped at every terminal transition, so no event from a finished
//!   stream can reach a later session.
//! - The assistant turn is persisted at most once per session: tokens
//!   queued before a cancellation are still drained (the event arm of
//!   the select is polled first), but once a terminal path begins no
//!   other path can run.
//!
//! Tokens are only accumulated in memory during streaming; persistence
//! is deferred to finalization. A crash mid-stream loses the partial
//! assistant turn, a completed turn is saved atomically once.

use crate::events::ChatEventBus;
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::inference::{ChatRequest, ChatTurn, InferenceGateway};
use braid_domain::{Conversation, Message, Role, StreamEvent, derive_title};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle state of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    Streaming,
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

/// Errors rejected at submission time, before any streaming.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A session is already in flight — single-session invariant.
    #[error("A chat session is already streaming")]
    Busy,

    #[error("No model selected")]
    NoModelSelected,

    #[error("Message is empty")]
    EmptyInput,

    /// Persisting the user turn (or creating the conversation) failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for [`ChatSessionManager::submit`].
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    /// Raw user input; rejected if empty after trimming.
    pub input: String,
    /// Currently selected model.
    pub model: String,
    /// Currently selected conversation, if any. `None` creates one.
    pub conversation_id: Option<String>,
}

/// Terminal result of one session.
#[derive(Debug)]
pub struct SessionOutcome {
    /// `Completed`, `Cancelled` or `Failed`.
    pub state: SessionState,
    /// Target conversation of the session.
    pub conversation_id: String,
    /// Set when the session created the conversation itself.
    pub created: Option<Conversation>,
    /// Authoritative message history re-synced from the store after the
    /// terminal transition. Empty when the re-sync itself failed.
    pub messages: Vec<Message>,
    /// The accumulated buffer. On `Failed` it was **not** persisted and
    /// serves only as a diagnostic trailer for display.
    pub assistant_content: Option<String>,
    /// Error text for `Failed` outcomes.
    pub error: Option<String>,
}

/// Drives streaming chat sessions against the store and the gateway.
///
/// At most one session may be active at any time; a submission while
/// one is in flight is rejected with [`SessionError::Busy`] and has no
/// side effects.
pub struct ChatSessionManager {
    store: Arc<dyn ConversationStore>,
    gateway: Arc<dyn InferenceGateway>,
    bus: Arc<ChatEventBus>,
    active: AtomicBool,
}

/// Clears the active flag when the session ends, whichever path it
/// takes out of `submit`.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSessionManager {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<dyn InferenceGateway>,
        bus: Arc<ChatEventBus>,
    ) -> Self {
        Self {
            store,
            gateway,
            bus,
            active: AtomicBool::new(false),
        }
    }

    /// Whether a session is currently in a non-terminal state.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Run one full session to its terminal state.
    ///
    /// Cancelling `cancel` while the stream is live tears the
    /// subscription down immediately and persists whatever was
    /// accumulated, like a successful finish with a truncated answer.
    pub async fn submit(
        &self,
        input: SendMessageInput,
        cancel: CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let text = input.input.trim().to_string();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if input.model.is_empty() {
            return Err(SessionError::NoModelSelected);
        }
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(SessionError::Busy);
        }
        let _guard = ActiveGuard(&self.active);

        debug!(model = %input.model, "session: submitting");

        // Submitting: resolve the target conversation, creating one
        // bound to the selected model when none is active.
        let mut created = None;
        let conversation_id = match input.conversation_id {
            Some(id) => id,
            None => {
                let title = derive_title(&text);
                let conversation = self
                    .store
                    .create_conversation(&title, &input.model)
                    .await?;
                let id = conversation.id.clone();
                created = Some(conversation);
                id
            }
        };

        // The user's turn is durable before any streaming begins.
        self.store
            .save_message(&conversation_id, Role::User, &text)
            .await?;

        // Replay context from the store, not from client memory.
        let history: Vec<ChatTurn> = self
            .store
            .get_messages(&conversation_id)
            .await?
            .into_iter()
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content,
            })
            .collect();

        // Subscribe before the stream task starts so no event can be
        // published into the void between the two.
        let mut subscription = self.bus.subscribe(&conversation_id);

        let request = ChatRequest {
            model: input.model.clone(),
            history,
            conversation_id: conversation_id.clone(),
        };
        let gateway = Arc::clone(&self.gateway);
        let bus = Arc::clone(&self.bus);
        let stream_conversation = conversation_id.clone();
        // A transport-level rejection of the start-stream call surfaces
        // as the same tagged terminal event a backend error would.
        tokio::spawn(async move {
            if let Err(e) = gateway.stream_chat(request).await {
                bus.publish(StreamEvent::Failed {
                    conversation_id: stream_conversation,
                    error: e.to_string(),
                });
            }
        });

        debug!(conversation_id = %conversation_id, "session: streaming");

        let mut buffer = String::new();
        loop {
            tokio::select! {
                // Queued events win over a racing cancellation: once the
                // terminal event has been pulled, finalize runs without
                // suspension and cancellation can no longer interleave.
                biased;

                event = subscription.recv() => match event {
                    Some(StreamEvent::Token { token, .. }) => buffer.push_str(&token),
                    Some(StreamEvent::Done { .. }) => {
                        drop(subscription);
                        return Ok(self
                            .finalize(SessionState::Completed, conversation_id, created, buffer, None)
                            .await);
                    }
                    Some(StreamEvent::Failed { error, .. }) => {
                        drop(subscription);
                        return Ok(self
                            .fail(conversation_id, created, buffer, error)
                            .await);
                    }
                    None => {
                        return Ok(self
                            .fail(conversation_id, created, buffer, "event feed closed".to_string())
                            .await);
                    }
                },

                _ = cancel.cancelled() => {
                    info!(conversation_id = %conversation_id, "session: cancelled by user");
                    // Drop the subscription before anything else: tokens
                    // already in flight must not be processed.
                    drop(subscription);
                    return Ok(self
                        .finalize(SessionState::Cancelled, conversation_id, created, buffer, None)
                        .await);
                }
            }
        }
    }

    /// Terminal transition for `Completed` and `Cancelled`: persist the
    /// non-empty buffer as exactly one assistant message, then re-sync
    /// from the store. Both paths run after the subscription is gone.
    async fn finalize(
        &self,
        state: SessionState,
        conversation_id: String,
        created: Option<Conversation>,
        buffer: String,
        error: Option<String>,
    ) -> SessionOutcome {
        debug!(conversation_id = %conversation_id, ?state, "session: finalizing");

        if !buffer.is_empty() {
            if let Err(e) = self
                .store
                .save_message(&conversation_id, Role::Assistant, &buffer)
                .await
            {
                // The conversation vanished mid-stream (or the write
                // failed); the generation is not recorded.
                warn!(conversation_id = %conversation_id, error = %e, "failed to persist assistant turn");
                return self.fail(conversation_id, created, buffer, e.to_string()).await;
            }
        }

        let messages = self.resync(&conversation_id).await;
        SessionOutcome {
            state,
            conversation_id,
            created,
            messages,
            assistant_content: (!buffer.is_empty()).then_some(buffer),
            error,
        }
    }

    /// Terminal transition for `Failed`: the buffer is preserved for
    /// display but never persisted.
    async fn fail(
        &self,
        conversation_id: String,
        created: Option<Conversation>,
        buffer: String,
        error: String,
    ) -> SessionOutcome {
        warn!(conversation_id = %conversation_id, error = %error, "session: failed");
        let messages = self.resync(&conversation_id).await;
        SessionOutcome {
            state: SessionState::Failed,
            conversation_id,
            created,
            messages,
            assistant_content: (!buffer.is_empty()).then_some(buffer),
            error: Some(error),
        }
    }

    /// Authoritative re-sync. Failure leaves the caller with stale data
    /// rather than an error — staleness is preferable to crashing.
    async fn resync(&self, conversation_id: &str) -> Vec<Message> {
        match self.store.get_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(conversation_id = %conversation_id, error = %e, "history re-sync failed");
                Vec::new()
            }
        }
    }
}
