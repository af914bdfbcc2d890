//! Conversation engine wiring the stores together.

use std::sync::Arc;

use chrono::Utc;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::core::config::ChatConfig;
use crate::core::errors::{ChatError, ChatResult};
use crate::core::ids::ConversationId;
use crate::core::types::{Conversation, Message, MessageRole};
use crate::query::{ConversationGroup, group_by_recency};
use crate::storage::{
    ConversationStore, MessageStore, SqliteConversationStore, SqliteMessageStore,
};
use crate::titling::TitleGenerator;

/// Backend dependencies for the conversation engine.
pub struct ChatBackends {
    /// Conversation metadata store implementation.
    pub conversations: Arc<dyn ConversationStore>,
    /// Message store implementation.
    pub messages: Arc<dyn MessageStore>,
}

impl ChatBackends {
    /// Build default `SQLite` backends from config, sharing one serialized
    /// connection.
    ///
    /// # Errors
    /// Returns an error if any backend cannot be initialized.
    pub async fn sqlite(config: &ChatConfig) -> ChatResult<Self> {
        let conn = Arc::new(Connection::open(config.storage.sqlite_path.clone()).await?);
        let messages = Arc::new(SqliteMessageStore::new(Arc::clone(&conn), &config.storage).await?);
        let conversations =
            Arc::new(SqliteConversationStore::new(conn, &config.storage).await?);

        Ok(Self {
            conversations,
            messages,
        })
    }
}

/// Conversation engine: CRUD, grouped listing, search, and auto-titling.
pub struct ChatEngine {
    config: ChatConfig,
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    titler: TitleGenerator,
}

impl ChatEngine {
    /// Create a new conversation engine.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ChatConfig, backends: ChatBackends) -> ChatResult<Self> {
        config.validate()?;
        let titler = TitleGenerator::new(&config.titling)
            .map_err(|err| ChatError::InvalidConfig(err.to_string()))?;

        Ok(Self {
            config,
            conversations: backends.conversations,
            messages: backends.messages,
            titler,
        })
    }

    /// Borrow the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// List all conversations, most recently updated first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn list_conversations(&self) -> ChatResult<Vec<Conversation>> {
        self.conversations.list_all().await
    }

    /// Create a conversation; `None` or a blank title falls back to the
    /// default title.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn create_conversation(&self, title: Option<&str>) -> ChatResult<Conversation> {
        let id = ConversationId::new();
        let now_ms = Utc::now().timestamp_millis();
        let conversation = self
            .conversations
            .create(id, title.unwrap_or_default(), now_ms)
            .await?;
        info!("Created new conversation: {id}");
        Ok(conversation)
    }

    /// Rename a conversation; a blank title falls back to the default title.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn rename_conversation(&self, id: ConversationId, title: &str) -> ChatResult<()> {
        self.conversations.update_title(id, title).await?;
        debug!("Renamed conversation {id}");
        Ok(())
    }

    /// Append a message, bumping the owning conversation's denormalized
    /// counter and activity timestamp.
    ///
    /// The first user message into a default-titled conversation also sets a
    /// generated title.
    ///
    /// # Errors
    /// Returns an error if the conversation does not exist or storage access
    /// fails.
    pub async fn append_message(
        &self,
        id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> ChatResult<Message> {
        let conversation = self
            .conversations
            .get_by_id(id)
            .await?
            .ok_or_else(|| ChatError::InvalidRecord(format!("unknown conversation: {id}")))?;

        let now_ms = Utc::now().timestamp_millis();
        let message = Message::with_role(id, role, content, now_ms);
        self.messages.append(message.clone()).await?;
        self.conversations.record_append(id, now_ms).await?;

        if conversation.message_count == 0
            && role.is_from_user()
            && conversation.has_default_title()
        {
            let title = self.titler.generate(content);
            self.conversations.update_title(id, &title).await?;
            debug!("Auto-titled conversation {id}: {title}");
        }

        Ok(message)
    }

    /// Load up to `limit` most recent messages for a conversation, oldest
    /// first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn load_messages(
        &self,
        id: ConversationId,
        limit: usize,
    ) -> ChatResult<Vec<Message>> {
        self.messages.load_recent(id, limit).await
    }

    /// Delete a conversation and every message that references it.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn delete_conversation(&self, id: ConversationId) -> ChatResult<()> {
        self.conversations.delete_cascade(id).await?;
        info!("Deleted conversation: {id}");
        Ok(())
    }

    /// Delete every message and every conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn clear_all(&self) -> ChatResult<()> {
        self.conversations.clear_all().await?;
        info!("Cleared all conversations");
        Ok(())
    }

    /// Conversations with at least one message, bucketed by recency with
    /// empty buckets skipped.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn grouped_conversations(&self) -> ChatResult<Vec<ConversationGroup>> {
        let active = self.conversations.list_active().await?;
        Ok(group_by_recency(active, Utc::now()))
    }

    /// Case-insensitive title search over conversations with at least one
    /// message.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn search_conversations(&self, query: &str) -> ChatResult<Vec<Conversation>> {
        self.conversations.search_titles(query).await
    }

    /// Check whether a conversation exists.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn conversation_exists(&self, id: ConversationId) -> ChatResult<bool> {
        self.conversations.exists(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn engine_with_messages() -> (ChatEngine, Arc<dyn MessageStore>) {
        let mut config = ChatConfig::default();
        config.storage.sqlite_path = PathBuf::from(":memory:");
        let backends = ChatBackends::sqlite(&config).await.unwrap();
        let messages = Arc::clone(&backends.messages);
        (ChatEngine::new(config, backends).unwrap(), messages)
    }

    async fn engine() -> ChatEngine {
        engine_with_messages().await.0
    }

    #[tokio::test]
    async fn test_message_count_increments_by_one_per_append() {
        let engine = engine().await;
        let created = engine.create_conversation(Some("counts")).await.unwrap();
        assert_eq!(created.message_count, 0);

        for expected in 1..=3_u32 {
            engine
                .append_message(created.id, MessageRole::User, "hello there everyone")
                .await
                .unwrap();
            let fetched = engine
                .conversations
                .get_by_id(created.id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(fetched.message_count, expected);
        }
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let (engine, messages) = engine_with_messages().await;
        let kept = engine.create_conversation(Some("kept")).await.unwrap();
        let doomed = engine.create_conversation(Some("doomed")).await.unwrap();

        engine
            .append_message(kept.id, MessageRole::User, "stays")
            .await
            .unwrap();
        engine
            .append_message(doomed.id, MessageRole::User, "goes")
            .await
            .unwrap();
        engine
            .append_message(doomed.id, MessageRole::Assistant, "also goes")
            .await
            .unwrap();

        engine.delete_conversation(doomed.id).await.unwrap();

        assert_eq!(messages.count(doomed.id).await.unwrap(), 0);
        assert_eq!(messages.count(kept.id).await.unwrap(), 1);
        assert!(!engine.conversation_exists(doomed.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grouped_listing_excludes_empty_conversations() {
        let engine = engine().await;
        engine.create_conversation(Some("empty")).await.unwrap();
        let active = engine.create_conversation(Some("active")).await.unwrap();
        engine
            .append_message(active.id, MessageRole::User, "ping")
            .await
            .unwrap();

        let groups = engine.grouped_conversations().await.unwrap();
        let all: Vec<&Conversation> =
            groups.iter().flat_map(|g| g.conversations.iter()).collect();
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|c| c.message_count > 0));
    }

    #[tokio::test]
    async fn test_search_results_are_subset_of_grouped_listing() {
        let engine = engine().await;
        for title in ["Rust lifetimes", "Rust macros", "Gardening"] {
            let c = engine.create_conversation(Some(title)).await.unwrap();
            engine
                .append_message(c.id, MessageRole::Assistant, "seeded")
                .await
                .unwrap();
        }

        let hits = engine.search_conversations("rust").await.unwrap();
        assert_eq!(hits.len(), 2);

        let groups = engine.grouped_conversations().await.unwrap();
        let grouped_ids: Vec<ConversationId> = groups
            .iter()
            .flat_map(|g| g.conversations.iter().map(|c| c.id))
            .collect();
        assert!(hits.iter().all(|h| grouped_ids.contains(&h.id)));
    }

    #[tokio::test]
    async fn test_first_user_message_titles_default_conversation() {
        let engine = engine().await;
        let created = engine.create_conversation(None).await.unwrap();
        assert!(created.has_default_title());

        engine
            .append_message(created.id, MessageRole::User, "how does the rust borrow checker work?")
            .await
            .unwrap();

        let fetched = engine
            .conversations
            .get_by_id(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "Rust borrow checker?");
    }

    #[tokio::test]
    async fn test_explicit_title_is_not_overwritten() {
        let engine = engine().await;
        let created = engine.create_conversation(Some("Picked by hand")).await.unwrap();

        engine
            .append_message(created.id, MessageRole::User, "what is rust?")
            .await
            .unwrap();

        let fetched = engine
            .conversations
            .get_by_id(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "Picked by hand");
    }

    #[tokio::test]
    async fn test_append_to_unknown_conversation_fails() {
        let engine = engine().await;
        let result = engine
            .append_message(ConversationId::new(), MessageRole::User, "lost")
            .await;
        assert!(matches!(result, Err(ChatError::InvalidRecord(_))));
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_tables() {
        let (engine, messages) = engine_with_messages().await;
        let a = engine.create_conversation(Some("a")).await.unwrap();
        engine
            .append_message(a.id, MessageRole::User, "one")
            .await
            .unwrap();

        engine.clear_all().await.unwrap();

        assert!(engine.list_conversations().await.unwrap().is_empty());
        assert_eq!(messages.count(a.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_messages_round_trip() {
        let engine = engine().await;
        let c = engine.create_conversation(Some("t")).await.unwrap();
        engine
            .append_message(c.id, MessageRole::User, "question")
            .await
            .unwrap();
        engine
            .append_message(c.id, MessageRole::Assistant, "answer")
            .await
            .unwrap();

        let loaded = engine.load_messages(c.id, 10).await.unwrap();
        assert_eq!(
            loaded.iter().map(|m| m.role).collect::<Vec<_>>(),
            vec![MessageRole::User, MessageRole::Assistant]
        );
    }
}
