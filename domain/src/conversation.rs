//! Conversation domain entities
//!
//! - [`Conversation`] — a durable thread bound to one model
//! - [`Message`] — a single turn within a conversation
//! - [`Role`] — who authored a message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum title length derived from the first user message.
pub const TITLE_MAX_CHARS: usize = 50;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire/storage representation (`"user"`, `"assistant"`, `"system"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A conversation thread (Entity)
///
/// Created on the first user message of a new thread. The model binding
/// is immutable after creation; deletion cascades to the messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message within a conversation (Entity)
///
/// `conversation_id` must reference an existing [`Conversation`].
/// Ordering within a conversation is creation-time order as recorded by
/// the store — never client-side accumulation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Derive a conversation title from its first user message.
///
/// Char-truncates at [`TITLE_MAX_CHARS`] and appends an ellipsis when
/// anything was cut off.
pub fn derive_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    let mut title: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_an_error() {
        assert!("robot".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn short_title_is_kept_verbatim() {
        assert_eq!(derive_title("Hello"), "Hello");
    }

    #[test]
    fn long_title_is_truncated_with_ellipsis() {
        let input = "a".repeat(80);
        let title = derive_title(&input);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 1);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn title_at_exact_cap_has_no_ellipsis() {
        let input = "b".repeat(TITLE_MAX_CHARS);
        assert_eq!(derive_title(&input), input);
    }

    #[test]
    fn title_trims_surrounding_whitespace() {
        assert_eq!(derive_title("  Hello there \n"), "Hello there");
    }

    #[test]
    fn title_truncation_is_char_based() {
        // Multibyte input must not be split inside a code point
        let input = "é".repeat(60);
        let title = derive_title(&input);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 1);
    }
}
