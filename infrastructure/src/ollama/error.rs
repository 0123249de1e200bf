//! Error types for the Ollama adapter

use braid_application::InferenceError;
use thiserror::Error;

/// Result type alias for Ollama operations
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Errors that can occur when talking to the Ollama HTTP API
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned status {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<OllamaError> for InferenceError {
    fn from(e: OllamaError) -> Self {
        match e {
            OllamaError::Http(inner) if inner.is_connect() => {
                InferenceError::Unavailable(inner.to_string())
            }
            OllamaError::Http(inner) => InferenceError::Transport(inner.to_string()),
            OllamaError::UnexpectedStatus(status) => {
                InferenceError::Rejected(format!("status {status}"))
            }
            OllamaError::Parse(inner) => InferenceError::Transport(inner.to_string()),
        }
    }
}
