//! Diesel row models for campaign persistence.

use super::schema::{campaign_history, campaign_tasks, group_info, post_stats, user_profiles};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result and insert row for campaign tasks.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = campaign_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Short task token.
    pub id: String,
    /// Lifecycle status.
    pub status: String,
    /// Target post ids.
    pub post_ids: Value,
    /// Reply text.
    pub message: String,
    /// Delivered replies.
    pub sent: i64,
    /// Failed replies.
    pub failed: i64,
    /// Recipient total.
    pub total: i64,
    /// Log lines.
    pub log: Value,
    /// Error text.
    pub last_error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial task update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = campaign_tasks)]
pub struct TaskChangeset {
    /// Lifecycle status.
    pub status: String,
    /// Delivered replies.
    pub sent: Option<i64>,
    /// Failed replies.
    pub failed: Option<i64>,
    /// Recipient total.
    pub total: Option<i64>,
    /// Log lines.
    pub log: Option<Value>,
    /// Error text.
    pub last_error: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for history rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = campaign_history)]
pub struct NewHistoryRow {
    /// Owning task.
    pub task_id: String,
    /// Recipient.
    pub user_id: i64,
    /// Anchor post.
    pub post_id: i64,
    /// Anchor comment.
    pub comment_id: i64,
    /// Outcome.
    pub outcome: String,
    /// Delivery time.
    pub sent_at: Option<DateTime<Utc>>,
    /// Failure description.
    pub error: Option<String>,
}

/// Insert model for post statistics.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = post_stats)]
pub struct PostStatsRow {
    /// Post identifier.
    pub post_id: i64,
    /// Owning community.
    pub group_id: i64,
    /// Snapshot day.
    pub date: NaiveDate,
    /// View count.
    pub views: i64,
    /// Like count.
    pub likes: i64,
    /// Comment count.
    pub comments: i64,
    /// Repost count.
    pub reposts: i64,
    /// Snapshot time.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for cached profiles.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_profiles)]
pub struct UserProfileRow {
    /// User identifier.
    pub user_id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Avatar URL.
    pub photo_url: String,
    /// Last time seen online.
    pub last_seen: Option<DateTime<Utc>>,
    /// Refresh time.
    pub updated_at: DateTime<Utc>,
}

/// Query result and insert row for community metadata.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = group_info)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupInfoRow {
    /// Community identifier.
    pub group_id: i64,
    /// Display name.
    pub name: String,
    /// Short address.
    pub screen_name: String,
    /// Description.
    pub description: String,
    /// Member count.
    pub members_count: i64,
    /// Avatar URL.
    pub photo_url: String,
    /// Refresh time.
    pub updated_at: DateTime<Utc>,
}
