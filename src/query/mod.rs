//! Display-oriented queries over conversations.

/// Recency bucketing for the sidebar.
pub mod grouping;

pub use grouping::{ConversationGroup, DateBucket, group_by_recency};
