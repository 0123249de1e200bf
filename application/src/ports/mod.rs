//! Ports (interfaces) that the application layer depends on.
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod conversation_store;
pub mod inference;
pub mod preferences;
pub mod telemetry;
