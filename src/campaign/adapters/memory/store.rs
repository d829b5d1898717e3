//! In-memory campaign store for tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::campaign::{
    domain::{
        CachedGroupInfo, CampaignHistoryEntry, CampaignStats, CampaignStatus, CampaignTask,
        PersistedCampaignData, PostStatsRecord, SendCounters, TASK_LOG_CAPACITY, TaskChanges,
        TaskId, TaskLog,
    },
    ports::{CampaignStore, CampaignStoreError, CampaignStoreResult},
};
use crate::social::domain::{GroupId, GroupInfo, PostId, UserId, UserProfile};

/// Thread-safe in-memory campaign store.
///
/// Tasks are kept as flat rows so partial updates behave like the
/// relational adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCampaignStore {
    state: Arc<RwLock<InMemoryCampaignState>>,
}

#[derive(Debug, Default)]
struct InMemoryCampaignState {
    tasks: HashMap<TaskId, TaskRecord>,
    history: Vec<CampaignHistoryEntry>,
    post_stats: HashMap<(PostId, GroupId, NaiveDate), PostStatsRecord>,
    users: HashMap<UserId, (UserProfile, DateTime<Utc>)>,
    groups: HashMap<GroupId, CachedGroupInfo>,
    failing_writes: bool,
    failing_history: bool,
}

#[derive(Debug, Clone)]
struct TaskRecord {
    id: TaskId,
    status: CampaignStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    post_ids: Vec<PostId>,
    message: String,
    sent: u64,
    failed: u64,
    total: u64,
    log: Vec<String>,
    error: Option<String>,
}

impl TaskRecord {
    fn from_task(task: &CampaignTask) -> Self {
        let counters = task.counters();
        Self {
            id: task.id().clone(),
            status: task.status(),
            created_at: task.created_at(),
            completed_at: task.completed_at(),
            post_ids: task.post_ids().to_vec(),
            message: task.message().to_owned(),
            sent: counters.sent,
            failed: counters.failed,
            total: counters.total,
            log: task.log().lines(),
            error: task.error().map(str::to_owned),
        }
    }

    fn apply(&mut self, changes: &TaskChanges) {
        self.status = changes.status;
        if let Some(sent) = changes.sent {
            self.sent = sent;
        }
        if let Some(failed) = changes.failed {
            self.failed = failed;
        }
        if let Some(total) = changes.total {
            self.total = total;
        }
        if let Some(log) = &changes.log {
            self.log.clone_from(log);
        }
        if let Some(error) = &changes.error {
            self.error = Some(error.clone());
        }
        if let Some(completed_at) = changes.completed_at {
            self.completed_at = Some(completed_at);
        }
    }

    fn to_task(&self) -> CampaignTask {
        CampaignTask::from_persisted(PersistedCampaignData {
            id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            completed_at: self.completed_at,
            post_ids: self.post_ids.clone(),
            message: self.message.clone(),
            counters: SendCounters {
                sent: self.sent,
                failed: self.failed,
                total: self.total,
            },
            log: TaskLog::from_lines(TASK_LOG_CAPACITY, self.log.iter().cloned()),
            error: self.error.clone(),
        })
    }
}

impl InMemoryCampaignStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a persistence error.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_writes(&self, failing: bool) -> CampaignStoreResult<()> {
        self.write()?.failing_writes = failing;
        Ok(())
    }

    /// Makes subsequent history appends fail while other writes succeed.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_history_appends(&self, failing: bool) -> CampaignStoreResult<()> {
        self.write()?.failing_history = failing;
        Ok(())
    }

    /// Returns the history rows of one campaign in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn history(&self, task_id: &TaskId) -> CampaignStoreResult<Vec<CampaignHistoryEntry>> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|entry| entry.task_id == *task_id)
            .cloned()
            .collect())
    }

    /// Returns every stored post statistics row.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn post_stats(&self) -> CampaignStoreResult<Vec<PostStatsRecord>> {
        Ok(self.read()?.post_stats.values().cloned().collect())
    }

    /// Returns a cached profile.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn user_profile(&self, user_id: UserId) -> CampaignStoreResult<Option<UserProfile>> {
        Ok(self
            .read()?
            .users
            .get(&user_id)
            .map(|(profile, _)| profile.clone()))
    }

    fn read(&self) -> CampaignStoreResult<RwLockReadGuard<'_, InMemoryCampaignState>> {
        self.state.read().map_err(|err| {
            CampaignStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> CampaignStoreResult<RwLockWriteGuard<'_, InMemoryCampaignState>> {
        self.state.write().map_err(|err| {
            CampaignStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn writable(&self) -> CampaignStoreResult<RwLockWriteGuard<'_, InMemoryCampaignState>> {
        let state = self.write()?;
        if state.failing_writes {
            return Err(CampaignStoreError::persistence(std::io::Error::other(
                "store is read-only",
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn create_or_replace_task(&self, task: &CampaignTask) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        state
            .tasks
            .insert(task.id().clone(), TaskRecord::from_task(task));
        Ok(())
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        changes: &TaskChanges,
    ) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        let record = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| CampaignStoreError::NotFound(task_id.clone()))?;
        record.apply(changes);
        Ok(())
    }

    async fn append_history(&self, entry: &CampaignHistoryEntry) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        if state.failing_history {
            return Err(CampaignStoreError::persistence(std::io::Error::other(
                "history table unavailable",
            )));
        }
        state.history.push(entry.clone());
        Ok(())
    }

    async fn upsert_post_stats(&self, record: &PostStatsRecord) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        state.post_stats.insert(
            (record.post_id, record.group_id, record.date),
            record.clone(),
        );
        Ok(())
    }

    async fn upsert_user_profile(
        &self,
        profile: &UserProfile,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        state
            .users
            .insert(profile.id, (profile.clone(), updated_at));
        Ok(())
    }

    async fn upsert_group_info(
        &self,
        info: &GroupInfo,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()> {
        let mut state = self.writable()?;
        state.groups.insert(
            info.id,
            CachedGroupInfo {
                info: info.clone(),
                updated_at,
            },
        );
        Ok(())
    }

    async fn find_group_info(
        &self,
        group_id: GroupId,
    ) -> CampaignStoreResult<Option<CachedGroupInfo>> {
        Ok(self.read()?.groups.get(&group_id).cloned())
    }

    async fn find_task(&self, task_id: &TaskId) -> CampaignStoreResult<Option<CampaignTask>> {
        Ok(self.read()?.tasks.get(task_id).map(TaskRecord::to_task))
    }

    async fn list_tasks(&self, limit: u64, offset: u64) -> CampaignStoreResult<Vec<CampaignTask>> {
        let state = self.read()?;
        let mut records: Vec<&TaskRecord> = state.tasks.values().collect();
        records.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(records
            .into_iter()
            .skip(skip)
            .take(take)
            .map(TaskRecord::to_task)
            .collect())
    }

    async fn campaign_stats(&self, task_id: &TaskId) -> CampaignStoreResult<CampaignStats> {
        let state = self.read()?;
        Ok(CampaignStats::from_entries(
            state.history.iter().filter(|entry| entry.task_id == *task_id),
        ))
    }
}
