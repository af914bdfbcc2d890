//! Recency bucketing of conversations for sidebar display.
//!
//! "This week" is a rolling seven-day window over UTC dates rather than a
//! calendar week, so bucketing does not depend on locale week-start rules.

use chrono::{DateTime, Days, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Conversation;

/// Fixed recency buckets, in display order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    /// Updated today (or carrying a future timestamp).
    Today,
    /// Updated yesterday.
    Yesterday,
    /// Updated within the past seven days, before yesterday.
    ThisWeek,
    /// Everything older.
    Earlier,
}

impl DateBucket {
    /// Buckets in the order they are displayed.
    pub const DISPLAY_ORDER: [Self; 4] = [Self::Today, Self::Yesterday, Self::ThisWeek, Self::Earlier];

    /// Human-readable section label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This Week",
            Self::Earlier => "Earlier",
        }
    }
}

/// A non-empty bucket of conversations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationGroup {
    /// Which recency bucket this group represents.
    pub bucket: DateBucket,
    /// Conversations in the bucket, most recent first.
    pub conversations: Vec<Conversation>,
}

/// Classify a millisecond timestamp relative to `now`.
#[must_use]
pub fn bucket_for(updated_at_ms: i64, now: DateTime<Utc>) -> DateBucket {
    let Some(updated) = Utc.timestamp_millis_opt(updated_at_ms).single() else {
        return DateBucket::Earlier;
    };

    let today = now.date_naive();
    let date = updated.date_naive();
    if date >= today {
        return DateBucket::Today;
    }
    if Some(date) == today.checked_sub_days(Days::new(1)) {
        return DateBucket::Yesterday;
    }
    match today.checked_sub_days(Days::new(7)) {
        Some(week_floor) if date > week_floor => DateBucket::ThisWeek,
        _ => DateBucket::Earlier,
    }
}

/// Bucket conversations by `updated_at`, preserving their relative order and
/// skipping empty buckets.
///
/// Callers pass the active listing only; this function does not re-filter by
/// message count.
#[must_use]
pub fn group_by_recency(
    conversations: Vec<Conversation>,
    now: DateTime<Utc>,
) -> Vec<ConversationGroup> {
    DateBucket::DISPLAY_ORDER
        .into_iter()
        .filter_map(|bucket| {
            let matching: Vec<Conversation> = conversations
                .iter()
                .filter(|c| bucket_for(c.updated_at, now) == bucket)
                .cloned()
                .collect();
            if matching.is_empty() {
                None
            } else {
                Some(ConversationGroup {
                    bucket,
                    conversations: matching,
                })
            }
        })
        .collect()
}
