//! Conversation and message records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ids::{ConversationId, MessageId};

/// A titled thread containing zero or more messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Creation timestamp in milliseconds since Unix epoch.
    pub created_at: i64,
    /// Last activity timestamp in milliseconds since Unix epoch.
    pub updated_at: i64,
    /// Denormalized number of messages in the conversation.
    pub message_count: u32,
}

impl Conversation {
    /// Title applied when none is supplied or the supplied one is blank.
    pub const DEFAULT_TITLE: &'static str = "New Conversation";

    /// Create a conversation record with zero messages.
    ///
    /// A blank `title` falls back to [`Self::DEFAULT_TITLE`].
    #[must_use]
    pub fn new(id: ConversationId, title: &str, now_ms: i64) -> Self {
        let title = title.trim();
        let title = if title.is_empty() {
            Self::DEFAULT_TITLE.to_string()
        } else {
            title.to_string()
        };
        Self {
            id,
            title,
            created_at: now_ms,
            updated_at: now_ms,
            message_count: 0,
        }
    }

    /// Whether the conversation still carries the default title.
    #[must_use]
    pub fn has_default_title(&self) -> bool {
        self.title == Self::DEFAULT_TITLE
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Typed by the user.
    User,
    /// Produced by the assistant.
    Assistant,
}

impl MessageRole {
    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Whether the author is the user.
    #[must_use]
    pub const fn is_from_user(self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(value.to_string()),
        }
    }
}

/// A single authored entry within a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author of the entry.
    pub role: MessageRole,
    /// Content payload.
    pub content: String,
    /// Timestamp in milliseconds since Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Build a user message.
    #[must_use]
    pub fn user(conversation_id: ConversationId, content: impl Into<String>, now_ms: i64) -> Self {
        Self::with_role(conversation_id, MessageRole::User, content, now_ms)
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self::with_role(conversation_id, MessageRole::Assistant, content, now_ms)
    }

    /// Build a message with an explicit role.
    #[must_use]
    pub fn with_role(
        conversation_id: ConversationId,
        role: MessageRole,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role,
            content: content.into(),
            timestamp: now_ms,
        }
    }
}
