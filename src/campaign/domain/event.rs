//! Progress events emitted by the campaign pipeline.

use crate::social::domain::{CommentId, PostId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Running send counters of a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCounters {
    /// Replies delivered.
    pub sent: u64,
    /// Replies that failed.
    pub failed: u64,
    /// Recipients in the campaign.
    pub total: u64,
}

impl SendCounters {
    /// Creates counters for a campaign of `total` recipients.
    #[must_use]
    pub const fn for_total(total: u64) -> Self {
        Self {
            sent: 0,
            failed: 0,
            total,
        }
    }

    /// Returns the number of attempts made so far.
    #[must_use]
    pub const fn attempted(self) -> u64 {
        self.sent.saturating_add(self.failed)
    }
}

/// One step of pipeline advancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A page of comments was read.
    CollectingPage {
        /// Post being read.
        post_id: PostId,
        /// Comments loaded from this post so far.
        loaded: u64,
        /// Distinct authors found on this post so far.
        unique: u64,
    },
    /// A post was fully read and merged into the recipient set.
    PostCollected {
        /// Post that was read.
        post_id: PostId,
        /// Distinct authors on this post alone.
        unique: u64,
        /// Distinct recipients across all posts read so far.
        unique_total: u64,
    },
    /// The recipient total is fixed and sending begins.
    SendingStarted {
        /// Number of recipients.
        total: u64,
    },
    /// One reply was attempted.
    SendAttempt {
        /// One-based position of the recipient.
        index: u64,
        /// Recipient.
        user_id: UserId,
        /// Post the reply is threaded under.
        post_id: PostId,
        /// Anchor comment.
        comment_id: CommentId,
        /// Counters after the attempt.
        counters: SendCounters,
    },
    /// A local failure that did not stop the campaign.
    Error {
        /// Description of the failure.
        message: String,
    },
    /// Every recipient was attempted.
    CampaignCompleted {
        /// Final counters.
        counters: SendCounters,
    },
}

impl ProgressEvent {
    /// Returns the event kind in storage form.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CollectingPage { .. } => "collecting_page",
            Self::PostCollected { .. } => "post_collected",
            Self::SendingStarted { .. } => "sending_started",
            Self::SendAttempt { .. } => "send_attempt",
            Self::Error { .. } => "error",
            Self::CampaignCompleted { .. } => "campaign_completed",
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectingPage {
                post_id,
                loaded,
                unique,
            } => write!(
                formatter,
                "Post {post_id}: loaded {loaded} comments, {unique} unique authors"
            ),
            Self::PostCollected {
                post_id,
                unique,
                unique_total,
            } => write!(
                formatter,
                "Post {post_id}: found {unique} commenters ({unique_total} unique in total)"
            ),
            Self::SendingStarted { total } => {
                write!(formatter, "Sending replies to {total} commenters")
            }
            Self::SendAttempt {
                index,
                user_id,
                post_id,
                counters,
                ..
            } => write!(
                formatter,
                "{index}/{total}: post {post_id}, user {user_id} (sent {sent}, failed {failed})",
                total = counters.total,
                sent = counters.sent,
                failed = counters.failed,
            ),
            Self::Error { message } => formatter.write_str(message),
            Self::CampaignCompleted { counters } => write!(
                formatter,
                "Done: sent {}, failed {} of {}",
                counters.sent, counters.failed, counters.total
            ),
        }
    }
}
