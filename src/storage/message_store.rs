//! `SQLite`-backed message store.

use std::str::FromStr;
use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::core::config::StorageConfig;
use crate::core::errors::{ChatError, ChatResult};
use crate::core::ids::ConversationId;
use crate::core::types::{Message, MessageRole};
use crate::storage::StoreFuture;

/// Trait for message storage.
pub trait MessageStore: Send + Sync {
    /// Append a message to its conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn append(&self, message: Message) -> StoreFuture<'_, ChatResult<()>>;

    /// Load the most recent messages for a conversation, oldest first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load_recent(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> StoreFuture<'_, ChatResult<Vec<Message>>>;

    /// Count messages belonging to a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn count(&self, conversation_id: ConversationId) -> StoreFuture<'_, ChatResult<u64>>;
}

/// `SQLite` implementation of message storage.
pub struct SqliteMessageStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteMessageStore {
    /// Initialize the store and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, config: &StorageConfig) -> ChatResult<Self> {
        let table = config.message_table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    conversation_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    ts INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_conversation_ts
                    ON {table_name} (conversation_id, ts);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl MessageStore for SqliteMessageStore {
    fn append(&self, message: Message) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (id, conversation_id, role, content, ts)
                             VALUES (?1, ?2, ?3, ?4, ?5)"
                        ),
                        rusqlite::params![
                            message.id,
                            message.conversation_id,
                            message.role.as_str(),
                            message.content,
                            message.timestamp
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn load_recent(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> StoreFuture<'_, ChatResult<Vec<Message>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let limit = i64::try_from(limit)
                .map_err(|_| ChatError::InvalidRecord("limit exceeds i64".to_string()))?;
            let mut rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, role, content, ts
                         FROM {table}
                         WHERE conversation_id = ?1
                         ORDER BY ts DESC, rowid DESC
                         LIMIT ?2"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![conversation_id, limit], |row| {
                            let id = row.get(0)?;
                            let role: String = row.get(1)?;
                            let content: String = row.get(2)?;
                            let ts: i64 = row.get(3)?;
                            Ok((id, role, content, ts))
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.reverse();
            let mut messages = Vec::with_capacity(rows.len());
            for (id, role, content, ts) in rows {
                let role = MessageRole::from_str(&role)
                    .map_err(|err| ChatError::InvalidRecord(format!("invalid role: {err}")))?;
                messages.push(Message {
                    id,
                    conversation_id,
                    role,
                    content,
                    timestamp: ts,
                });
            }

            Ok(messages)
        })
    }

    fn count(&self, conversation_id: ConversationId) -> StoreFuture<'_, ChatResult<u64>> {
        Box::pin(async move {
            let table = self.table.clone();
            let count = self
                .conn
                .call(move |conn| {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![conversation_id],
                        |row| row.get(0),
                    )?;
                    Ok(count)
                })
                .await?;
            let count = u64::try_from(count)
                .map_err(|_| ChatError::InvalidRecord("invalid message count".to_string()))?;
            Ok(count)
        })
    }
}
