//! Campaign submission, background execution and status queries.

use super::{
    CommentCollector, RegistryError, ReplySender, TaskProgressRecorder, TaskRegistry,
    collect_recipients,
};
use crate::campaign::{
    domain::{
        CampaignDomainError, CampaignStats, CampaignTask, PostStatsRecord, SendCounters,
        TaskChanges, TaskId,
    },
    ports::{CampaignStore, CampaignStoreError, ProgressSinkError},
};
use crate::social::{
    domain::{CommunityCredentials, GroupId, PostId, SocialDomainError},
    ports::{SocialApi, SocialApiError, SocialApiFactory},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Request payload for starting a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCampaignRequest {
    post_ids: Vec<i64>,
    message: Option<String>,
    credentials: Option<CommunityCredentials>,
}

impl SubmitCampaignRequest {
    /// Creates a request targeting `post_ids` in the given order.
    #[must_use]
    pub fn new(post_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            post_ids: post_ids.into_iter().collect(),
            message: None,
            credentials: None,
        }
    }

    /// Sets the reply text. Without it the configured default is used.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the community the campaign runs against.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<CommunityCredentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Tunables shared by every campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSettings {
    /// Pause between consecutive API calls.
    pub request_delay: Duration,
    /// Reply text used when a request carries none.
    pub default_message: String,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(350),
            default_message: String::new(),
        }
    }
}

/// Service-level errors for campaign operations.
#[derive(Debug, Error)]
pub enum CampaignServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] CampaignDomainError),
    /// An identifier was rejected.
    #[error(transparent)]
    Social(#[from] SocialDomainError),
    /// Storage operation failed.
    #[error(transparent)]
    Store(#[from] CampaignStoreError),
    /// Social API call failed.
    #[error(transparent)]
    Api(#[from] SocialApiError),
    /// Task registry is unavailable.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The request cannot be served.
    #[error("invalid campaign request: {0}")]
    Validation(String),
}

/// Result type for campaign service operations.
pub type CampaignServiceResult<T> = Result<T, CampaignServiceError>;

/// Error that escaped the campaign pipeline and fails the task.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Progress could not be recorded.
    #[error(transparent)]
    Sink(#[from] ProgressSinkError),
    /// A lifecycle rule was violated.
    #[error(transparent)]
    Domain(#[from] CampaignDomainError),
    /// A durable write failed.
    #[error(transparent)]
    Store(#[from] CampaignStoreError),
    /// The live task disappeared.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

type PipelineResult<T> = Result<T, PipelineError>;

/// Campaign orchestration service.
///
/// Owns the task registry; every submission runs as a supervised
/// background job keyed by task id.
pub struct CampaignService<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    factory: Arc<F>,
    store: Arc<S>,
    clock: Arc<C>,
    registry: TaskRegistry,
    settings: CampaignSettings,
}

impl<F, S, C> CampaignService<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new campaign service with an empty registry.
    #[must_use]
    pub fn new(factory: Arc<F>, store: Arc<S>, clock: Arc<C>, settings: CampaignSettings) -> Self {
        Self {
            factory,
            store,
            clock,
            registry: TaskRegistry::new(),
            settings,
        }
    }

    /// Returns the registry shared with running jobs.
    #[must_use]
    pub const fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Validates and stores a campaign, then starts it in the background.
    ///
    /// Returns the pending task as stored.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignServiceError::Validation`] without credentials,
    /// [`CampaignServiceError::Domain`] when no post remains after removing
    /// duplicates or the message is blank, and storage errors when the task
    /// cannot be recorded. Nothing is started on error.
    pub async fn submit(
        &self,
        request: SubmitCampaignRequest,
    ) -> CampaignServiceResult<CampaignTask> {
        let SubmitCampaignRequest {
            post_ids,
            message,
            credentials,
        } = request;

        let credentials = credentials.ok_or_else(|| {
            CampaignServiceError::Validation("no active community is configured".to_owned())
        })?;
        let post_ids = post_ids
            .into_iter()
            .map(PostId::new)
            .collect::<Result<Vec<_>, _>>()?;
        let message = message.unwrap_or_else(|| self.settings.default_message.clone());
        let task = CampaignTask::new(post_ids, &message, &*self.clock)?;

        self.store.create_or_replace_task(&task).await?;
        self.registry.insert(task.clone())?;

        let job = Arc::new(CampaignJob {
            task_id: task.id().clone(),
            post_ids: task.post_ids().to_vec(),
            message: task.message().to_owned(),
            credentials,
            factory: Arc::clone(&self.factory),
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            registry: self.registry.clone(),
            delay: self.settings.request_delay,
        });
        let handle = tokio::spawn(job.run());
        self.registry.attach_job(task.id().clone(), handle)?;

        info!(task_id = %task.id(), posts = task.post_ids().len(), "campaign submitted");
        Ok(task)
    }

    /// Returns the live snapshot of a task, or the stored one for tasks
    /// started by an earlier process.
    ///
    /// # Errors
    ///
    /// Returns registry or storage errors.
    pub async fn task_snapshot(
        &self,
        task_id: &TaskId,
    ) -> CampaignServiceResult<Option<CampaignTask>> {
        if let Some(task) = self.registry.snapshot(task_id)? {
            return Ok(Some(task));
        }
        Ok(self.store.find_task(task_id).await?)
    }

    /// Lists stored tasks newest first, substituting live snapshots for
    /// tasks still held in the registry.
    ///
    /// # Errors
    ///
    /// Returns registry or storage errors.
    pub async fn list_task_snapshots(
        &self,
        limit: u64,
        offset: u64,
    ) -> CampaignServiceResult<Vec<CampaignTask>> {
        let stored = self.store.list_tasks(limit, offset).await?;
        let mut live: HashMap<TaskId, CampaignTask> = self
            .registry
            .snapshots()?
            .into_iter()
            .map(|task| (task.id().clone(), task))
            .collect();
        Ok(stored
            .into_iter()
            .map(|task| live.remove(task.id()).unwrap_or(task))
            .collect())
    }

    /// Aggregates the recorded reply attempts of a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignServiceError::Store`] when the query fails.
    pub async fn campaign_stats(&self, task_id: &TaskId) -> CampaignServiceResult<CampaignStats> {
        Ok(self.store.campaign_stats(task_id).await?)
    }

    /// Waits for the background job of a task to finish.
    ///
    /// Returns `false` when no job is pending for the task.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignServiceError::Registry`] when the registry is
    /// unavailable.
    pub async fn wait(&self, task_id: &TaskId) -> CampaignServiceResult<bool> {
        Ok(self.registry.wait(task_id).await?)
    }
}

/// Everything one background campaign needs, owned by the job.
struct CampaignJob<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    task_id: TaskId,
    post_ids: Vec<PostId>,
    message: String,
    credentials: CommunityCredentials,
    factory: Arc<F>,
    store: Arc<S>,
    clock: Arc<C>,
    registry: TaskRegistry,
    delay: Duration,
}

impl<F, S, C> CampaignJob<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Connects, runs the pipeline in its own task so that a panic is
    /// contained, then releases the client whatever the outcome.
    async fn run(self: Arc<Self>) {
        let api = match self.factory.connect(&self.credentials) {
            Ok(api) => Arc::new(api),
            Err(err) => {
                self.fail(format!("Failed to connect to the community API: {err}"))
                    .await;
                return;
            }
        };

        let outcome = tokio::spawn(Arc::clone(&self).pipeline(Arc::clone(&api))).await;
        api.close().await;

        match outcome {
            Ok(Ok(counters)) => {
                info!(
                    task_id = %self.task_id,
                    sent = counters.sent,
                    failed = counters.failed,
                    total = counters.total,
                    "campaign completed"
                );
                self.record_note(format!(
                    "Campaign finished: sent {}, failed {}",
                    counters.sent, counters.failed
                ))
                .await;
            }
            Ok(Err(err)) => self.fail(err.to_string()).await,
            Err(err) => self.fail(format!("Campaign aborted: {err}")).await,
        }
    }

    async fn pipeline(self: Arc<Self>, api: Arc<F::Api>) -> PipelineResult<SendCounters> {
        let changes = self
            .registry
            .update(&self.task_id, CampaignTask::start_collecting)??;
        self.store.update_task(&self.task_id, &changes).await?;

        let recorder = TaskProgressRecorder::new(
            self.task_id.clone(),
            self.registry.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        );

        let collector = CommentCollector::new(Arc::clone(&api), self.delay);
        let recipients = collect_recipients(&collector, &self.post_ids, &recorder).await?;

        self.cache_post_stats(api.as_ref()).await;

        let sender = ReplySender::new(
            api,
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.delay,
        );
        Ok(sender.send(&recipients, &self.message, &recorder).await?)
    }

    async fn cache_post_stats(&self, api: &F::Api) {
        let group_id: GroupId = self.credentials.group_id();
        for &post_id in &self.post_ids {
            match api.get_post(post_id).await {
                Ok(Some(details)) => {
                    let record =
                        PostStatsRecord::from_details(group_id, post_id, &details, self.clock.utc());
                    if let Err(err) = self.store.upsert_post_stats(&record).await {
                        warn!(post_id = %post_id, error = %err, "post stats write failed");
                    }
                }
                Ok(None) => warn!(post_id = %post_id, "post not found while caching stats"),
                Err(err) => warn!(post_id = %post_id, error = %err, "post stats lookup failed"),
            }
        }
    }

    async fn record_note(&self, line: String) {
        match self.registry.update(&self.task_id, |task| task.note(line)) {
            Ok(changes) => self.persist(&changes).await,
            Err(err) => warn!(task_id = %self.task_id, error = %err, "closing note dropped"),
        }
    }

    async fn fail(&self, reason: String) {
        error!(task_id = %self.task_id, error = %reason, "campaign failed");
        match self.registry.update(&self.task_id, |task| task.fail(reason)) {
            Ok(Ok(changes)) => self.persist(&changes).await,
            Ok(Err(err)) => warn!(task_id = %self.task_id, error = %err, "failure not recorded"),
            Err(err) => warn!(task_id = %self.task_id, error = %err, "failure not recorded"),
        }
    }

    async fn persist(&self, changes: &TaskChanges) {
        if let Err(err) = self.store.update_task(&self.task_id, changes).await {
            error!(task_id = %self.task_id, error = %err, "task state write failed");
        }
    }
}
