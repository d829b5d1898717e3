//! Records returned by the social network API.

use super::{CommentId, GroupId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One comment as listed under a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Raw author id; negative for communities, zero for deleted authors.
    pub author_id: i64,
}

impl Comment {
    /// Creates a comment record.
    #[must_use]
    pub const fn new(id: CommentId, author_id: i64) -> Self {
        Self { id, author_id }
    }

    /// Returns the author when it is a person.
    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        UserId::from_author(self.author_id)
    }
}

/// Wall post with its engagement counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetails {
    /// Post identifier.
    pub id: Option<PostId>,
    /// Full post text.
    pub text: String,
    /// Publication time, when reported.
    pub published_at: Option<DateTime<Utc>>,
    /// View count.
    pub views: u64,
    /// Like count.
    pub likes: u64,
    /// Comment count.
    pub comments: u64,
    /// Repost count.
    pub reposts: u64,
    /// Number of attachments.
    pub attachments_count: u64,
    /// Whether any attachment is a photo.
    pub has_photo: bool,
    /// Whether any attachment is a video.
    pub has_video: bool,
}

impl PostDetails {
    /// Returns a single-line preview of the post text, at most `limit`
    /// characters plus an ellipsis.
    #[must_use]
    pub fn preview(&self, limit: usize) -> String {
        text_preview(&self.text, limit)
    }
}

/// Profile data cached for campaign recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Avatar URL.
    pub photo_url: String,
    /// Last time the user was online, when visible.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Community metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Community identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Short address.
    pub screen_name: String,
    /// Description text.
    pub description: String,
    /// Member count.
    pub members_count: u64,
    /// Avatar URL.
    pub photo_url: String,
}

/// Collapses whitespace runs that contain line breaks and truncates the text
/// to `limit` characters, appending an ellipsis when anything was cut.
#[must_use]
pub fn text_preview(text: &str, limit: usize) -> String {
    let clean = text.replace('\n', " ");
    let trimmed = clean.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_owned();
    }
    let head: String = trimmed.chars().take(limit).collect();
    format!("{}…", head.trim_end())
}
