//! Ollama HTTP gateway.
//!
//! Implements [`InferenceGateway`] against the local Ollama API:
//! `GET /api/tags` for the model catalog, `POST /api/chat` with
//! `"stream": true` for generation. Chat responses arrive as
//! newline-delimited JSON chunks; each chunk's `message.content` is
//! published to the event bus as a token, and the `done` chunk (or the
//! end of the byte stream) as the terminal event.

use crate::ollama::error::OllamaError;
use async_trait::async_trait;
use braid_application::{
    ChatEventBus, ChatRequest, ChatTurn, InferenceError, InferenceGateway, PullProgress,
};
use braid_domain::{ModelDescriptor, StreamEvent};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    message: Option<OllamaChunkMessage>,
    done: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Option<Vec<ModelDescriptor>>,
}

#[derive(Debug, Deserialize)]
struct OllamaPullChunk {
    status: Option<String>,
    completed: Option<u64>,
    total: Option<u64>,
}

/// Accumulates raw bytes and yields complete NDJSON lines.
#[derive(Default)]
struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// The next complete, non-empty line, if any.
    fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim().to_string();
            self.buffer.drain(..=pos);
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }
}

pub struct OllamaGateway {
    client: reqwest::Client,
    base_url: String,
    bus: Arc<ChatEventBus>,
}

impl OllamaGateway {
    pub fn new(base_url: impl Into<String>, bus: Arc<ChatEventBus>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bus,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<(), OllamaError> {
        let body = OllamaChatRequest {
            model: &request.model,
            messages: &request.history,
            stream: true,
        };

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OllamaError::UnexpectedStatus(response.status()));
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();

        while let Some(chunk) = stream.next().await {
            lines.push(&chunk?);

            while let Some(line) = lines.next_line() {
                let Ok(parsed) = serde_json::from_str::<OllamaChatChunk>(&line) else {
                    trace!(line = %line, "skipping unparseable chat chunk");
                    continue;
                };

                if let Some(content) = parsed.message.and_then(|m| m.content)
                    && !content.is_empty()
                {
                    self.bus.publish(StreamEvent::Token {
                        conversation_id: request.conversation_id.clone(),
                        token: content,
                    });
                }

                if parsed.done.unwrap_or(false) {
                    self.bus.publish(StreamEvent::Done {
                        conversation_id: request.conversation_id.clone(),
                    });
                    return Ok(());
                }
            }
        }

        // Stream ended without an explicit done chunk
        self.bus.publish(StreamEvent::Done {
            conversation_id: request.conversation_id.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl InferenceGateway for OllamaGateway {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, InferenceError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(OllamaError::Http)?;

        if !response.status().is_success() {
            return Err(OllamaError::UnexpectedStatus(response.status()).into());
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(OllamaError::Http)?;
        let models = tags.models.unwrap_or_default();
        debug!(count = models.len(), "listed models");
        Ok(models)
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<(), InferenceError> {
        debug!(
            model = %request.model,
            conversation_id = %request.conversation_id,
            turns = request.history.len(),
            "starting chat stream"
        );
        self.chat(&request).await.map_err(InferenceError::from)
    }

    async fn pull_model(
        &self,
        name: &str,
        on_progress: &(dyn Fn(PullProgress) + Send + Sync),
    ) -> Result<(), InferenceError> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(OllamaError::Http)?;

        if !response.status().is_success() {
            return Err(OllamaError::UnexpectedStatus(response.status()).into());
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();

        while let Some(chunk) = stream.next().await {
            lines.push(&chunk.map_err(OllamaError::Http)?);

            while let Some(line) = lines.next_line() {
                if let Ok(parsed) = serde_json::from_str::<OllamaPullChunk>(&line) {
                    on_progress(PullProgress {
                        status: parsed.status.unwrap_or_default(),
                        completed: parsed.completed,
                        total: parsed.total,
                    });
                }
            }
        }

        Ok(())
    }

    async fn delete_model(&self, name: &str) -> Result<(), InferenceError> {
        let response = self
            .client
            .delete(self.url("/api/delete"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(OllamaError::Http)?;

        if !response.status().is_success() {
            return Err(OllamaError::UnexpectedStatus(response.status()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_domain::Role;

    #[test]
    fn line_buffer_yields_complete_lines_across_chunks() {
        let mut lines = LineBuffer::default();
        lines.push(b"{\"a\":1}\n{\"b\":");
        assert_eq!(lines.next_line(), Some("{\"a\":1}".to_string()));
        assert_eq!(lines.next_line(), None);

        lines.push(b"2}\n");
        assert_eq!(lines.next_line(), Some("{\"b\":2}".to_string()));
    }

    #[test]
    fn line_buffer_skips_blank_lines() {
        let mut lines = LineBuffer::default();
        lines.push(b"\n\n{\"x\":1}\n");
        assert_eq!(lines.next_line(), Some("{\"x\":1}".to_string()));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn chat_chunk_parses_token_and_done() {
        let chunk: OllamaChatChunk =
            serde_json::from_str(r#"{"message":{"content":"Hi"},"done":false}"#).unwrap();
        assert_eq!(chunk.message.unwrap().content.as_deref(), Some("Hi"));
        assert_eq!(chunk.done, Some(false));

        let done: OllamaChatChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(done.message.is_none());
        assert_eq!(done.done, Some(true));
    }

    #[test]
    fn chat_request_serializes_wire_shape() {
        let body = OllamaChatRequest {
            model: "llama3",
            messages: &[ChatTurn {
                role: Role::User,
                content: "Hello".to_string(),
            }],
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn tags_response_tolerates_missing_models_field() {
        let tags: OllamaTagsResponse = serde_json::from_str("{}").unwrap();
        assert!(tags.models.is_none());
    }
}
