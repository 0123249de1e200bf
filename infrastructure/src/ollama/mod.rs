//! Ollama adapter: HTTP gateway speaking the local inference API.

pub mod error;
pub mod gateway;
