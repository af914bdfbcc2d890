//! `SQLite`-backed conversation metadata store.

use std::sync::Arc;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::core::config::StorageConfig;
use crate::core::errors::ChatResult;
use crate::core::ids::ConversationId;
use crate::core::types::Conversation;
use crate::storage::StoreFuture;

/// Trait for conversation metadata storage.
pub trait ConversationStore: Send + Sync {
    /// List all conversations ordered by `updated_at` DESC.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list_all(&self) -> StoreFuture<'_, ChatResult<Vec<Conversation>>>;

    /// List conversations with at least one message, ordered by `updated_at` DESC.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list_active(&self) -> StoreFuture<'_, ChatResult<Vec<Conversation>>>;

    /// Get a conversation by ID.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_by_id(
        &self,
        id: ConversationId,
    ) -> StoreFuture<'_, ChatResult<Option<Conversation>>>;

    /// Create a new conversation record with zero messages.
    ///
    /// A blank title falls back to [`Conversation::DEFAULT_TITLE`].
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn create(
        &self,
        id: ConversationId,
        title: &str,
        now_ms: i64,
    ) -> StoreFuture<'_, ChatResult<Conversation>>;

    /// Update the title of a conversation. A blank title falls back to the
    /// default title.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn update_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, ChatResult<()>>;

    /// Bump `updated_at` and increment the denormalized message count.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn record_append(&self, id: ConversationId, now_ms: i64) -> StoreFuture<'_, ChatResult<()>>;

    /// Delete a conversation and all messages that reference it, in one
    /// transaction.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_cascade(&self, id: ConversationId) -> StoreFuture<'_, ChatResult<()>>;

    /// Delete every message, then every conversation, in one transaction.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn clear_all(&self) -> StoreFuture<'_, ChatResult<()>>;

    /// Case-insensitive substring match against titles, restricted to
    /// conversations with at least one message.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn search_titles(&self, query: &str) -> StoreFuture<'_, ChatResult<Vec<Conversation>>>;

    /// Check if a conversation exists.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn exists(&self, id: ConversationId) -> StoreFuture<'_, ChatResult<bool>>;
}

/// `SQLite` implementation of conversation metadata storage.
pub struct SqliteConversationStore {
    conn: Arc<Connection>,
    table: String,
    message_table: String,
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        message_count: row.get(4)?,
    })
}

impl SqliteConversationStore {
    /// Initialize the store and create the table if it doesn't exist.
    ///
    /// The message table name is kept so cascading deletes can cover both
    /// tables in one transaction.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, config: &StorageConfig) -> ChatResult<Self> {
        let table = config.conversation_table.clone();
        let message_table = config.message_table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    message_count INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_updated
                    ON {table_name} (updated_at DESC);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            table,
            message_table,
        })
    }

    fn list_where(&self, predicate: &'static str) -> StoreFuture<'_, ChatResult<Vec<Conversation>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, title, created_at, updated_at, message_count
                         FROM {table}
                         WHERE {predicate}
                         ORDER BY updated_at DESC"
                    ))?;
                    let rows = stmt
                        .query_map([], row_to_conversation)?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;
            Ok(rows)
        })
    }
}

impl ConversationStore for SqliteConversationStore {
    fn list_all(&self) -> StoreFuture<'_, ChatResult<Vec<Conversation>>> {
        self.list_where("1 = 1")
    }

    fn list_active(&self) -> StoreFuture<'_, ChatResult<Vec<Conversation>>> {
        self.list_where("message_count > 0")
    }

    fn get_by_id(
        &self,
        id: ConversationId,
    ) -> StoreFuture<'_, ChatResult<Option<Conversation>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, title, created_at, updated_at, message_count
                         FROM {table}
                         WHERE id = ?1"
                    ))?;
                    let row = stmt
                        .query_row(rusqlite::params![id], row_to_conversation)
                        .optional()?;
                    Ok(row)
                })
                .await?;
            Ok(row)
        })
    }

    fn create(
        &self,
        id: ConversationId,
        title: &str,
        now_ms: i64,
    ) -> StoreFuture<'_, ChatResult<Conversation>> {
        let conversation = Conversation::new(id, title, now_ms);
        Box::pin(async move {
            let table = self.table.clone();
            let record = conversation.clone();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (id, title, created_at, updated_at, message_count)
                             VALUES (?1, ?2, ?3, ?4, ?5)"
                        ),
                        rusqlite::params![
                            record.id,
                            record.title,
                            record.created_at,
                            record.updated_at,
                            record.message_count
                        ],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(conversation)
        })
    }

    fn update_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, ChatResult<()>> {
        let title = title.trim().to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let title = if title.is_empty() {
                Conversation::DEFAULT_TITLE.to_string()
            } else {
                title
            };
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("UPDATE {table} SET title = ?1 WHERE id = ?2"),
                        rusqlite::params![title, id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn record_append(&self, id: ConversationId, now_ms: i64) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "UPDATE {table}
                             SET updated_at = ?1, message_count = message_count + 1
                             WHERE id = ?2"
                        ),
                        rusqlite::params![now_ms, id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn delete_cascade(&self, id: ConversationId) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let message_table = self.message_table.clone();
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        &format!("DELETE FROM {message_table} WHERE conversation_id = ?1"),
                        rusqlite::params![id],
                    )?;
                    tx.execute(
                        &format!("DELETE FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                    )?;
                    tx.commit()?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn clear_all(&self) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let message_table = self.message_table.clone();
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(&format!("DELETE FROM {message_table}"), [])?;
                    tx.execute(&format!("DELETE FROM {table}"), [])?;
                    tx.commit()?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn search_titles(&self, query: &str) -> StoreFuture<'_, ChatResult<Vec<Conversation>>> {
        // SQLite's NOCASE collation only folds ASCII, so the substring match
        // runs in Rust after narrowing to active conversations.
        let needle = query.trim().to_lowercase();
        Box::pin(async move {
            let mut rows = self.list_active().await?;
            if !needle.is_empty() {
                rows.retain(|c| c.title.to_lowercase().contains(&needle));
            }
            Ok(rows)
        })
    }

    fn exists(&self, id: ConversationId) -> StoreFuture<'_, ChatResult<bool>> {
        Box::pin(async move {
            let table = self.table.clone();
            let exists = self
                .conn
                .call(move |conn| {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                        |row| row.get(0),
                    )?;
                    Ok(count > 0)
                })
                .await?;
            Ok(exists)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::message_store::SqliteMessageStore;

    async fn open_store() -> SqliteConversationStore {
        let conn = Arc::new(Connection::open(":memory:").await.unwrap());
        let config = StorageConfig::default();
        // The message table must exist for cascade statements to resolve.
        SqliteMessageStore::new(Arc::clone(&conn), &config)
            .await
            .unwrap();
        SqliteConversationStore::new(conn, &config).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_starts_with_zero_messages() {
        let store = open_store().await;
        let created = store
            .create(ConversationId::new(), "Trip planning", 1_000)
            .await
            .unwrap();
        assert_eq!(created.message_count, 0);

        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_blank_title_uses_default() {
        let store = open_store().await;
        let created = store
            .create(ConversationId::new(), "  ", 1_000)
            .await
            .unwrap();
        assert_eq!(created.title, Conversation::DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_list_all_orders_by_recency() {
        let store = open_store().await;
        let older = store.create(ConversationId::new(), "old", 1_000).await.unwrap();
        let newer = store.create(ConversationId::new(), "new", 2_000).await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(
            listed.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
    }

    #[tokio::test]
    async fn test_record_append_increments_count_and_touches() {
        let store = open_store().await;
        let created = store.create(ConversationId::new(), "t", 1_000).await.unwrap();

        store.record_append(created.id, 5_000).await.unwrap();
        store.record_append(created.id, 6_000).await.unwrap();

        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.message_count, 2);
        assert_eq!(fetched.updated_at, 6_000);
    }

    #[tokio::test]
    async fn test_list_active_excludes_empty_conversations() {
        let store = open_store().await;
        let empty = store.create(ConversationId::new(), "empty", 1_000).await.unwrap();
        let active = store.create(ConversationId::new(), "active", 2_000).await.unwrap();
        store.record_append(active.id, 3_000).await.unwrap();

        let listed = store.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
        assert!(listed.iter().all(|c| c.id != empty.id));
    }

    #[tokio::test]
    async fn test_update_title_and_blank_fallback() {
        let store = open_store().await;
        let created = store.create(ConversationId::new(), "t", 1_000).await.unwrap();

        store.update_title(created.id, "Renamed").await.unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Renamed");

        store.update_title(created.id, "   ").await.unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, Conversation::DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_active_only() {
        let store = open_store().await;
        let rust = store.create(ConversationId::new(), "Rust lifetimes", 1_000).await.unwrap();
        store.record_append(rust.id, 1_500).await.unwrap();
        let cooking = store.create(ConversationId::new(), "Cooking", 2_000).await.unwrap();
        store.record_append(cooking.id, 2_500).await.unwrap();
        // Matching title but no messages: must not appear.
        store.create(ConversationId::new(), "rust drafts", 3_000).await.unwrap();

        let hits = store.search_titles("RUST").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, rust.id);

        // Results are a subset of the active listing.
        let active = store.list_active().await.unwrap();
        assert!(hits.iter().all(|h| active.iter().any(|a| a.id == h.id)));
    }

    #[tokio::test]
    async fn test_exists() {
        let store = open_store().await;
        let created = store.create(ConversationId::new(), "t", 1_000).await.unwrap();
        assert!(store.exists(created.id).await.unwrap());
        assert!(!store.exists(ConversationId::new()).await.unwrap());
    }
}
