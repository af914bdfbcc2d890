//! Error types for conversation storage.

use thiserror::Error;

/// Conversation subsystem error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A stored record failed to decode or referenced a missing row.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
}

/// Convenience result alias for conversation operations.
pub type ChatResult<T> = Result<T, ChatError>;
