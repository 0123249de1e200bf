//! Application layer for braid
//!
//! This crate contains the use cases and the ports (trait interfaces)
//! that the infrastructure layer implements. The centrepiece is
//! [`ChatSessionManager`], the state machine that drives one
//! "send message → stream tokens → persist → reconcile" cycle.

pub mod events;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use events::{ChatEventBus, StreamSubscription};
pub use ports::conversation_store::{ConversationStore, StoreError};
pub use ports::inference::{ChatRequest, ChatTurn, InferenceError, InferenceGateway, PullProgress};
pub use ports::preferences::ModelPreferences;
pub use ports::telemetry::TelemetryProbe;
pub use use_cases::chat_session::{
    ChatSessionManager, SendMessageInput, SessionError, SessionOutcome, SessionState,
};
pub use use_cases::controller::ConversationController;
pub use use_cases::model_catalog::ModelCatalog;
pub use use_cases::telemetry::{TelemetryHandle, TelemetryPoller};
