//! Configuration for conversation storage.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{ChatError, ChatResult};

/// Top-level configuration for the conversation engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Title generation settings.
    pub titling: TitlingConfig,
    /// Session / navigation settings.
    pub session: SessionConfig,
}

impl ChatConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        if self.storage.sqlite_path.as_os_str().is_empty() {
            return Err(ChatError::InvalidConfig(
                "storage.sqlite_path must not be empty".to_string(),
            ));
        }

        for (name, table) in [
            ("storage.conversation_table", &self.storage.conversation_table),
            ("storage.message_table", &self.storage.message_table),
        ] {
            if table.is_empty() {
                return Err(ChatError::InvalidConfig(format!("{name} must not be empty")));
            }
            if !table
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            {
                return Err(ChatError::InvalidConfig(format!(
                    "{name} must be alphanumeric or underscore"
                )));
            }
        }

        if self.titling.max_chars == 0 {
            return Err(ChatError::InvalidConfig(
                "titling.max_chars must be > 0".to_string(),
            ));
        }

        if self.titling.max_keywords == 0 {
            return Err(ChatError::InvalidConfig(
                "titling.max_keywords must be > 0".to_string(),
            ));
        }

        if self.session.search_debounce_ms == 0 {
            return Err(ChatError::InvalidConfig(
                "session.search_debounce_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Storage configuration for conversation data.
///
/// Table names are interpolated into SQL and therefore restricted to
/// alphanumeric/underscore by [`ChatConfig::validate`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Conversation table name.
    pub conversation_table: String,
    /// Message table name.
    pub message_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("conversations.sqlite"),
            conversation_table: "conversations".to_string(),
            message_table: "messages".to_string(),
        }
    }
}

/// Title generation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TitlingConfig {
    /// Character budget before a raw message is truncated with an ellipsis.
    pub max_chars: usize,
    /// Maximum number of keywords kept from a question.
    pub max_keywords: usize,
}

impl Default for TitlingConfig {
    fn default() -> Self {
        Self {
            max_chars: 30,
            max_keywords: 3,
        }
    }
}

/// Session / navigation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Debounce interval applied to search-text changes, in milliseconds.
    pub search_debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
        }
    }
}
