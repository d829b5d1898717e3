//! Storage port for campaign tasks, history and cached metadata.

use crate::campaign::domain::{
    CachedGroupInfo, CampaignHistoryEntry, CampaignStats, CampaignTask, PostStatsRecord,
    TaskChanges, TaskId,
};
use crate::social::domain::{GroupId, GroupInfo, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for campaign store operations.
pub type CampaignStoreResult<T> = Result<T, CampaignStoreError>;

/// Durable campaign storage contract.
///
/// Writes are idempotent upserts keyed by task id, `(post, group, date)`,
/// user id or group id, except [`CampaignStore::append_history`], which is
/// insert-only. Implementations serialize individual writes.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Stores a full task snapshot, replacing any existing row.
    async fn create_or_replace_task(&self, task: &CampaignTask) -> CampaignStoreResult<()>;

    /// Writes the changed fields of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError::NotFound`] when the task does not exist.
    async fn update_task(&self, task_id: &TaskId, changes: &TaskChanges)
    -> CampaignStoreResult<()>;

    /// Appends one reply attempt.
    async fn append_history(&self, entry: &CampaignHistoryEntry) -> CampaignStoreResult<()>;

    /// Upserts the daily engagement snapshot of a post.
    async fn upsert_post_stats(&self, record: &PostStatsRecord) -> CampaignStoreResult<()>;

    /// Upserts a cached user profile.
    async fn upsert_user_profile(
        &self,
        profile: &UserProfile,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()>;

    /// Upserts cached community metadata.
    async fn upsert_group_info(
        &self,
        info: &GroupInfo,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()>;

    /// Reads cached community metadata.
    async fn find_group_info(&self, group_id: GroupId)
    -> CampaignStoreResult<Option<CachedGroupInfo>>;

    /// Reads one task. Returns `None` when it does not exist.
    async fn find_task(&self, task_id: &TaskId) -> CampaignStoreResult<Option<CampaignTask>>;

    /// Lists tasks, newest first.
    async fn list_tasks(&self, limit: u64, offset: u64) -> CampaignStoreResult<Vec<CampaignTask>>;

    /// Aggregates the history rows of one campaign.
    async fn campaign_stats(&self, task_id: &TaskId) -> CampaignStoreResult<CampaignStats>;
}

/// Errors returned by campaign store implementations.
#[derive(Debug, Clone, Error)]
pub enum CampaignStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CampaignStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
