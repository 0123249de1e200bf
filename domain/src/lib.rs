//! Domain layer for braid
//!
//! This crate contains the core entities and value objects for the chat
//! orchestrator. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Conversation
//!
//! A durable thread of [`Message`]s bound to a single inference model.
//! The persisted store is the source of truth for message ordering.
//!
//! ## Stream
//!
//! During generation the backend delivers [`StreamEvent`]s: zero or more
//! tokens followed by exactly one tagged terminal event.

pub mod conversation;
pub mod model;
pub mod stream;
pub mod telemetry;

// Re-export commonly used types
pub use conversation::{Conversation, Message, Role, derive_title};
pub use model::ModelDescriptor;
pub use stream::StreamEvent;
pub use telemetry::{ServiceStatus, SystemStats};
