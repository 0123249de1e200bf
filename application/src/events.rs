//! Chat event bus — typed publish/subscribe keyed by conversation id.
//!
//! The token/terminal feed is shared by every conversation, so
//! correctness depends on events never leaking across conversations.
//! Rather than broadcasting to all subscribers and filtering with a
//! runtime conditional, the bus routes at the subscription boundary:
//! [`ChatEventBus::subscribe`] registers a channel for one conversation
//! id and [`ChatEventBus::publish`] delivers an event only to channels
//! registered for that event's id.
//!
//! A [`StreamSubscription`] is a scoped acquisition: dropping it closes
//! the channel, and the dead sender is pruned on the next publish. A
//! session drops its subscription at every terminal transition so that
//! at most one live subscription exists per session and stale events
//! from a finished stream land nowhere.

use braid_domain::StreamEvent;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

struct Subscriber {
    /// `Some(id)` routes one conversation; `None` observes every
    /// conversation (display taps).
    filter: Option<String>,
    tx: mpsc::UnboundedSender<StreamEvent>,
}

/// Shared publish/subscribe channel for [`StreamEvent`]s.
#[derive(Default)]
pub struct ChatEventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChatEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel for events addressed to `conversation_id`.
    pub fn subscribe(&self, conversation_id: &str) -> StreamSubscription {
        self.register(Some(conversation_id.to_string()))
    }

    /// Register a channel receiving events for every conversation.
    ///
    /// Intended for display layers that need tokens before a freshly
    /// created conversation's id is known. Sessions themselves must use
    /// [`Self::subscribe`]; the single-active-session rule is what makes
    /// an unfiltered tap unambiguous.
    pub fn subscribe_all(&self) -> StreamSubscription {
        self.register(None)
    }

    fn register(&self, filter: Option<String>) -> StreamSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.push(Subscriber { filter, tx });
        StreamSubscription { receiver: rx }
    }

    /// Deliver `event` to every live subscription for its conversation
    /// id. Events addressed to a conversation nobody subscribed to are
    /// dropped silently — the backend may keep producing into the void
    /// after a cancellation.
    pub fn publish(&self, event: StreamEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|s| {
            if s.filter.as_deref().is_some_and(|id| id != event.conversation_id()) {
                return !s.tx.is_closed();
            }
            match s.tx.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    trace!(
                        conversation_id = %event.conversation_id(),
                        "pruning dropped subscription"
                    );
                    false
                }
            }
        });
    }
}

/// Receiving side of one per-conversation subscription.
///
/// Owned exclusively by the session it was created for; dropping it
/// deregisters the subscription.
pub struct StreamSubscription {
    receiver: mpsc::UnboundedReceiver<StreamEvent>,
}

impl StreamSubscription {
    /// Next event for this conversation, or `None` if the bus is gone.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Next already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.receiver.try_recv().ok()
    }
}
