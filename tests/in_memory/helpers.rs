//! Shared fixtures for in-memory integration tests.

use chrono::{DateTime, TimeDelta, Utc};
use commentcast::campaign::{
    adapters::memory::InMemoryCampaignStore,
    domain::{
        CampaignStatus, CampaignTask, PersistedCampaignData, SendCounters, TaskId, TaskLog,
    },
    services::{CampaignService, CampaignSettings},
};
use commentcast::social::{
    adapters::memory::InMemorySocialApi,
    domain::{Comment, CommentId, CommunityCredentials, GroupId, PostId, UserId},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

/// Campaign service wired to in-memory adapters.
pub type TestCampaignService =
    CampaignService<InMemorySocialApi, InMemoryCampaignStore, DefaultClock>;

/// Provides a fresh scripted social API.
#[fixture]
pub fn api() -> InMemorySocialApi {
    InMemorySocialApi::new()
}

/// Provides a fresh in-memory store.
#[fixture]
pub fn store() -> InMemoryCampaignStore {
    InMemoryCampaignStore::new()
}

/// Builds a service without pacing delays over shared adapter state.
#[must_use]
pub fn service(api: &InMemorySocialApi, store: &InMemoryCampaignStore) -> TestCampaignService {
    CampaignService::new(
        Arc::new(api.clone()),
        Arc::new(store.clone()),
        Arc::new(DefaultClock),
        CampaignSettings {
            request_delay: Duration::ZERO,
            default_message: "Thanks for commenting!".to_owned(),
        },
    )
}

/// Returns credentials for community 5.
///
/// # Panics
///
/// Panics if the fixed credentials are rejected.
#[must_use]
pub fn credentials() -> CommunityCredentials {
    let group_id = GroupId::new(5).expect("valid group id");
    CommunityCredentials::new(group_id, "user-token", "group-token").expect("valid credentials")
}

/// Returns a validated post id.
///
/// # Panics
///
/// Panics for non-positive ids.
#[must_use]
pub fn post(id: i64) -> PostId {
    PostId::new(id).expect("valid post id")
}

/// Returns a validated user id.
///
/// # Panics
///
/// Panics for non-positive ids.
#[must_use]
pub fn user(id: i64) -> UserId {
    UserId::new(id).expect("valid user id")
}

/// Seeds `post_id` with one comment per author; comment ids are
/// `post_id * 100 + author`.
///
/// # Panics
///
/// Panics if the scripted API cannot be updated.
pub fn seed_post(api: &InMemorySocialApi, post_id: i64, authors: &[i64]) {
    let comments = authors.iter().map(|&author| {
        let id = u64::try_from(post_id * 100 + author).expect("positive comment id");
        Comment::new(CommentId::new(id), author)
    });
    api.add_comments(post(post_id), comments)
        .expect("seed comments");
}

/// Builds a stored-looking task created `age` ago.
///
/// # Panics
///
/// Panics if the fixed post id is rejected.
#[must_use]
pub fn persisted_task(age: TimeDelta, status: CampaignStatus) -> CampaignTask {
    let created_at: DateTime<Utc> = Utc::now() - age;
    CampaignTask::from_persisted(PersistedCampaignData {
        id: TaskId::new(),
        status,
        created_at,
        completed_at: None,
        post_ids: vec![post(1)],
        message: "Stored earlier".to_owned(),
        counters: SendCounters::default(),
        log: TaskLog::default(),
        error: None,
    })
}
