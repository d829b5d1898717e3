//! Shared world state for campaign delivery BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use commentcast::campaign::{
    adapters::memory::InMemoryCampaignStore,
    domain::CampaignTask,
    services::{CampaignService, CampaignServiceError, CampaignSettings},
};
use commentcast::social::{
    adapters::memory::InMemorySocialApi,
    domain::{CommentId, CommunityCredentials, GroupId},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestCampaignService =
    CampaignService<InMemorySocialApi, InMemoryCampaignStore, DefaultClock>;

/// Reply text used when a scenario does not set one.
pub const REPLY_TEXT: &str = "Thanks for joining the discussion!";

/// Scenario world for campaign delivery behaviour tests.
pub struct CampaignWorld {
    pub api: InMemorySocialApi,
    pub store: InMemoryCampaignStore,
    pub service: TestCampaignService,
    pub last_submission: Option<Result<CampaignTask, CampaignServiceError>>,
    pub last_task: Option<CampaignTask>,
}

impl CampaignWorld {
    /// Creates a world with an empty community and store.
    #[must_use]
    pub fn new() -> Self {
        let api = InMemorySocialApi::new();
        let store = InMemoryCampaignStore::new();
        let service = CampaignService::new(
            Arc::new(api.clone()),
            Arc::new(store.clone()),
            Arc::new(DefaultClock),
            CampaignSettings {
                request_delay: Duration::ZERO,
                default_message: REPLY_TEXT.to_owned(),
            },
        );

        Self {
            api,
            store,
            service,
            last_submission: None,
            last_task: None,
        }
    }

    /// Returns the task accepted by the last submission.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing was submitted or the submission failed.
    pub fn submitted_task(&self) -> Result<&CampaignTask, eyre::Report> {
        match self.last_submission.as_ref() {
            Some(Ok(task)) => Ok(task),
            Some(Err(err)) => Err(eyre::eyre!("submission failed: {err}")),
            None => Err(eyre::eyre!("no campaign submitted in scenario world")),
        }
    }
}

impl Default for CampaignWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CampaignWorld {
    CampaignWorld::default()
}

/// Credentials of the community every scenario runs against.
///
/// # Errors
///
/// Returns an error if the fixed identifiers are rejected.
pub fn credentials() -> Result<CommunityCredentials, eyre::Report> {
    Ok(CommunityCredentials::new(
        GroupId::new(5)?,
        "user-token",
        "group-token",
    )?)
}

/// Comment left by `user` on `post`; ids are `post * 10 + user`.
#[must_use]
pub fn comment_id(post: u64, user: u64) -> CommentId {
    CommentId::new(post * 10 + user)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
