//! Durable campaign history and cached metadata records.

use super::{ParseSendOutcomeError, TaskId};
use crate::social::domain::{CommentId, GroupId, GroupInfo, PostDetails, PostId, UserId};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one reply attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// The reply was posted.
    Sent,
    /// The reply was rejected or the call failed.
    Failed,
}

impl SendOutcome {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SendOutcome {
    type Error = ParseSendOutcomeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseSendOutcomeError(value.to_owned())),
        }
    }
}

/// One append-only row per reply attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignHistoryEntry {
    /// Campaign the attempt belongs to.
    pub task_id: TaskId,
    /// Recipient.
    pub user_id: UserId,
    /// Post the reply was threaded under.
    pub post_id: PostId,
    /// Anchor comment.
    pub comment_id: CommentId,
    /// Attempt outcome.
    pub outcome: SendOutcome,
    /// Delivery time; only set for delivered replies.
    pub sent_at: Option<DateTime<Utc>>,
    /// Failure description, when known.
    pub error: Option<String>,
}

impl CampaignHistoryEntry {
    /// Creates a history row stamped at `now` when the reply was delivered.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        user_id: UserId,
        post_id: PostId,
        comment_id: CommentId,
        outcome: SendOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            user_id,
            post_id,
            comment_id,
            outcome,
            sent_at: (outcome == SendOutcome::Sent).then_some(now),
            error: None,
        }
    }
}

/// Aggregate of the history rows of one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    /// Attempts recorded.
    pub total: u64,
    /// Delivered replies.
    pub sent: u64,
    /// Failed replies.
    pub failed: u64,
}

impl CampaignStats {
    /// Folds history rows into totals.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CampaignHistoryEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut stats, entry| {
                stats.total += 1;
                match entry.outcome {
                    SendOutcome::Sent => stats.sent += 1,
                    SendOutcome::Failed => stats.failed += 1,
                }
                stats
            })
    }
}

/// Daily engagement snapshot of one post, keyed by `(post, group, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStatsRecord {
    /// Community owning the post.
    pub group_id: GroupId,
    /// Post identifier.
    pub post_id: PostId,
    /// Snapshot day.
    pub date: NaiveDate,
    /// View count.
    pub views: u64,
    /// Like count.
    pub likes: u64,
    /// Comment count.
    pub comments: u64,
    /// Repost count.
    pub reposts: u64,
    /// Time the snapshot was taken.
    pub updated_at: DateTime<Utc>,
}

impl PostStatsRecord {
    /// Builds today's snapshot from fetched post details.
    #[must_use]
    pub fn from_details(
        group_id: GroupId,
        post_id: PostId,
        details: &PostDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            post_id,
            date: now.date_naive(),
            views: details.views,
            likes: details.likes,
            comments: details.comments,
            reposts: details.reposts,
            updated_at: now,
        }
    }
}

/// Stored community metadata with its refresh time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGroupInfo {
    /// Community metadata.
    pub info: GroupInfo,
    /// Time of the last refresh.
    pub updated_at: DateTime<Utc>,
}

impl CachedGroupInfo {
    /// Returns whether the record was refreshed less than `max_age` before
    /// `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        now.signed_duration_since(self.updated_at) < max_age
    }
}
