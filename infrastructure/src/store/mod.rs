//! Conversation persistence adapters.

pub mod sqlite;
