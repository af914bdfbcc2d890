//! `SQLite`-backed stores for conversations and messages.
//!
//! Both stores share one [`tokio_rusqlite::Connection`], a handle to a single
//! background worker thread, so every read and write is serialized through the
//! same context.

/// Conversation metadata store.
pub mod conversation_store;
/// Message store.
pub mod message_store;

pub use conversation_store::{ConversationStore, SqliteConversationStore};
pub use message_store::{MessageStore, SqliteMessageStore};

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
