//! `PostgreSQL` store implementation for campaign persistence.

use super::{
    models::{
        GroupInfoRow, NewHistoryRow, PostStatsRow, TaskChangeset, TaskRow, UserProfileRow,
    },
    schema::{campaign_history, campaign_tasks, group_info, post_stats, user_profiles},
};
use crate::campaign::{
    domain::{
        CachedGroupInfo, CampaignHistoryEntry, CampaignStats, CampaignStatus, CampaignTask,
        PersistedCampaignData, PostStatsRecord, SendCounters, SendOutcome, TASK_LOG_CAPACITY,
        TaskChanges, TaskId, TaskLog,
    },
    ports::{CampaignStore, CampaignStoreError, CampaignStoreResult},
};
use crate::social::domain::{GroupId, GroupInfo, PostId, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;

/// `PostgreSQL` connection pool type used by campaign adapters.
pub type CampaignPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed campaign store.
#[derive(Debug, Clone)]
pub struct PostgresCampaignStore {
    pool: CampaignPgPool,
}

impl PostgresCampaignStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: CampaignPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> CampaignStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CampaignStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CampaignStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(CampaignStoreError::persistence)?
    }
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    async fn create_or_replace_task(&self, task: &CampaignTask) -> CampaignStoreResult<()> {
        let row = to_task_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(campaign_tasks::table)
                .values(&row)
                .on_conflict(campaign_tasks::id)
                .do_update()
                .set((
                    campaign_tasks::status.eq(excluded(campaign_tasks::status)),
                    campaign_tasks::post_ids.eq(excluded(campaign_tasks::post_ids)),
                    campaign_tasks::message.eq(excluded(campaign_tasks::message)),
                    campaign_tasks::sent.eq(excluded(campaign_tasks::sent)),
                    campaign_tasks::failed.eq(excluded(campaign_tasks::failed)),
                    campaign_tasks::total.eq(excluded(campaign_tasks::total)),
                    campaign_tasks::log.eq(excluded(campaign_tasks::log)),
                    campaign_tasks::last_error.eq(excluded(campaign_tasks::last_error)),
                    campaign_tasks::completed_at.eq(excluded(campaign_tasks::completed_at)),
                ))
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        changes: &TaskChanges,
    ) -> CampaignStoreResult<()> {
        let id = task_id.clone();
        let changeset = to_changeset(changes)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(campaign_tasks::table.find(id.as_str()))
                .set(&changeset)
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            if updated == 0 {
                return Err(CampaignStoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn append_history(&self, entry: &CampaignHistoryEntry) -> CampaignStoreResult<()> {
        let row = NewHistoryRow {
            task_id: entry.task_id.as_str().to_owned(),
            user_id: to_db_int(entry.user_id.value())?,
            post_id: to_db_int(entry.post_id.value())?,
            comment_id: to_db_int(entry.comment_id.value())?,
            outcome: entry.outcome.as_str().to_owned(),
            sent_at: entry.sent_at,
            error: entry.error.clone(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(campaign_history::table)
                .values(&row)
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn upsert_post_stats(&self, record: &PostStatsRecord) -> CampaignStoreResult<()> {
        let row = PostStatsRow {
            post_id: to_db_int(record.post_id.value())?,
            group_id: to_db_int(record.group_id.value())?,
            date: record.date,
            views: to_db_int(record.views)?,
            likes: to_db_int(record.likes)?,
            comments: to_db_int(record.comments)?,
            reposts: to_db_int(record.reposts)?,
            updated_at: record.updated_at,
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(post_stats::table)
                .values(&row)
                .on_conflict((post_stats::post_id, post_stats::group_id, post_stats::date))
                .do_update()
                .set((
                    post_stats::views.eq(excluded(post_stats::views)),
                    post_stats::likes.eq(excluded(post_stats::likes)),
                    post_stats::comments.eq(excluded(post_stats::comments)),
                    post_stats::reposts.eq(excluded(post_stats::reposts)),
                    post_stats::updated_at.eq(excluded(post_stats::updated_at)),
                ))
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn upsert_user_profile(
        &self,
        profile: &UserProfile,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()> {
        let row = UserProfileRow {
            user_id: to_db_int(profile.id.value())?,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            photo_url: profile.photo_url.clone(),
            last_seen: profile.last_seen,
            updated_at,
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(user_profiles::table)
                .values(&row)
                .on_conflict(user_profiles::user_id)
                .do_update()
                .set((
                    user_profiles::first_name.eq(excluded(user_profiles::first_name)),
                    user_profiles::last_name.eq(excluded(user_profiles::last_name)),
                    user_profiles::photo_url.eq(excluded(user_profiles::photo_url)),
                    user_profiles::last_seen.eq(excluded(user_profiles::last_seen)),
                    user_profiles::updated_at.eq(excluded(user_profiles::updated_at)),
                ))
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn upsert_group_info(
        &self,
        info: &GroupInfo,
        updated_at: DateTime<Utc>,
    ) -> CampaignStoreResult<()> {
        let row = GroupInfoRow {
            group_id: to_db_int(info.id.value())?,
            name: info.name.clone(),
            screen_name: info.screen_name.clone(),
            description: info.description.clone(),
            members_count: to_db_int(info.members_count)?,
            photo_url: info.photo_url.clone(),
            updated_at,
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(group_info::table)
                .values(&row)
                .on_conflict(group_info::group_id)
                .do_update()
                .set((
                    group_info::name.eq(excluded(group_info::name)),
                    group_info::screen_name.eq(excluded(group_info::screen_name)),
                    group_info::description.eq(excluded(group_info::description)),
                    group_info::members_count.eq(excluded(group_info::members_count)),
                    group_info::photo_url.eq(excluded(group_info::photo_url)),
                    group_info::updated_at.eq(excluded(group_info::updated_at)),
                ))
                .execute(connection)
                .map_err(CampaignStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_group_info(
        &self,
        group_id: GroupId,
    ) -> CampaignStoreResult<Option<CachedGroupInfo>> {
        let id = to_db_int(group_id.value())?;
        self.run_blocking(move |connection| {
            let row = group_info::table
                .find(id)
                .select(GroupInfoRow::as_select())
                .first::<GroupInfoRow>(connection)
                .optional()
                .map_err(CampaignStoreError::persistence)?;
            row.map(row_to_group_info).transpose()
        })
        .await
    }

    async fn find_task(&self, task_id: &TaskId) -> CampaignStoreResult<Option<CampaignTask>> {
        let id = task_id.clone();
        self.run_blocking(move |connection| {
            let row = campaign_tasks::table
                .find(id.as_str())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(CampaignStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_tasks(&self, limit: u64, offset: u64) -> CampaignStoreResult<Vec<CampaignTask>> {
        let limit = to_db_int(limit)?;
        let offset = to_db_int(offset)?;
        self.run_blocking(move |connection| {
            let rows = campaign_tasks::table
                .order((campaign_tasks::created_at.desc(), campaign_tasks::id.desc()))
                .limit(limit)
                .offset(offset)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(CampaignStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn campaign_stats(&self, task_id: &TaskId) -> CampaignStoreResult<CampaignStats> {
        let id = task_id.clone();
        self.run_blocking(move |connection| {
            let outcomes = campaign_history::table
                .filter(campaign_history::task_id.eq(id.as_str()))
                .select(campaign_history::outcome)
                .load::<String>(connection)
                .map_err(CampaignStoreError::persistence)?;
            outcomes
                .iter()
                .try_fold(CampaignStats::default(), |mut stats, outcome| {
                    stats.total += 1;
                    match SendOutcome::try_from(outcome.as_str())
                        .map_err(CampaignStoreError::persistence)?
                    {
                        SendOutcome::Sent => stats.sent += 1,
                        SendOutcome::Failed => stats.failed += 1,
                    }
                    Ok(stats)
                })
        })
        .await
    }
}

fn to_db_int(value: u64) -> CampaignStoreResult<i64> {
    i64::try_from(value).map_err(CampaignStoreError::persistence)
}

fn from_db_int(value: i64) -> CampaignStoreResult<u64> {
    u64::try_from(value).map_err(CampaignStoreError::persistence)
}

fn to_task_row(task: &CampaignTask) -> CampaignStoreResult<TaskRow> {
    let counters = task.counters();
    Ok(TaskRow {
        id: task.id().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        post_ids: serde_json::to_value(task.post_ids()).map_err(CampaignStoreError::persistence)?,
        message: task.message().to_owned(),
        sent: to_db_int(counters.sent)?,
        failed: to_db_int(counters.failed)?,
        total: to_db_int(counters.total)?,
        log: serde_json::to_value(task.log().lines()).map_err(CampaignStoreError::persistence)?,
        last_error: task.error().map(str::to_owned),
        created_at: task.created_at(),
        completed_at: task.completed_at(),
    })
}

fn to_changeset(changes: &TaskChanges) -> CampaignStoreResult<TaskChangeset> {
    Ok(TaskChangeset {
        status: changes.status.as_str().to_owned(),
        sent: changes.sent.map(to_db_int).transpose()?,
        failed: changes.failed.map(to_db_int).transpose()?,
        total: changes.total.map(to_db_int).transpose()?,
        log: changes
            .log
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(CampaignStoreError::persistence)?,
        last_error: changes.error.clone(),
        completed_at: changes.completed_at,
    })
}

fn row_to_task(row: TaskRow) -> CampaignStoreResult<CampaignTask> {
    let TaskRow {
        id,
        status,
        post_ids,
        message,
        sent,
        failed,
        total,
        log,
        last_error,
        created_at,
        completed_at,
    } = row;

    let id = TaskId::parse(&id).map_err(CampaignStoreError::persistence)?;
    let status =
        CampaignStatus::try_from(status.as_str()).map_err(CampaignStoreError::persistence)?;
    let post_ids = serde_json::from_value::<Vec<PostId>>(post_ids)
        .map_err(CampaignStoreError::persistence)?;
    let lines =
        serde_json::from_value::<Vec<String>>(log).map_err(CampaignStoreError::persistence)?;

    let data = PersistedCampaignData {
        id,
        status,
        created_at,
        completed_at,
        post_ids,
        message,
        counters: SendCounters {
            sent: from_db_int(sent)?,
            failed: from_db_int(failed)?,
            total: from_db_int(total)?,
        },
        log: TaskLog::from_lines(TASK_LOG_CAPACITY, lines),
        error: last_error,
    };
    Ok(CampaignTask::from_persisted(data))
}

fn row_to_group_info(row: GroupInfoRow) -> CampaignStoreResult<CachedGroupInfo> {
    let GroupInfoRow {
        group_id,
        name,
        screen_name,
        description,
        members_count,
        photo_url,
        updated_at,
    } = row;

    Ok(CachedGroupInfo {
        info: GroupInfo {
            id: GroupId::new(group_id).map_err(CampaignStoreError::persistence)?,
            name,
            screen_name,
            description,
            members_count: from_db_int(members_count)?,
            photo_url,
        },
        updated_at,
    })
}
