//! Streaming events for chat generation.
//!
//! [`StreamEvent`] represents individual events in a streaming response,
//! enabling real-time display of model output as it is generated.
//!
//! Every event carries the id of the conversation it belongs to — the
//! event feed is shared across conversations and subscribers are keyed
//! by that id. A stream is zero or more [`Token`](StreamEvent::Token)
//! events followed by exactly one terminal event
//! ([`Done`](StreamEvent::Done) or [`Failed`](StreamEvent::Failed)).

/// An event in a streaming chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One incremental fragment of generated text.
    Token {
        conversation_id: String,
        token: String,
    },
    /// The stream finished successfully (terminal).
    Done { conversation_id: String },
    /// The stream finished with an error (terminal).
    ///
    /// Transport-level rejection of the originating call and backend
    /// errors are both surfaced through this variant.
    Failed {
        conversation_id: String,
        error: String,
    },
}

impl StreamEvent {
    /// The conversation this event is addressed to.
    pub fn conversation_id(&self) -> &str {
        match self {
            StreamEvent::Token {
                conversation_id, ..
            }
            | StreamEvent::Done { conversation_id }
            | StreamEvent::Failed {
                conversation_id, ..
            } => conversation_id,
        }
    }

    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Failed { .. })
    }
}
