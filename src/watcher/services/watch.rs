//! Watcher registry and polling loop.

use crate::social::{
    domain::{CommunityCredentials, PostId, SocialDomainError},
    ports::{SocialApi, SocialApiError, SocialApiFactory},
};
use crate::watcher::domain::{WatchDomainError, WatchId, WatchState};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Comments read when a watcher starts; all of them are marked as seen.
pub const INITIAL_SCAN: u64 = 50;

/// Comments read on every poll.
pub const POLL_BATCH: u64 = 30;

/// Pauses used by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    /// Pause after each reply and after a failed read.
    pub reply_delay: Duration,
    /// Pause before the next poll when something was answered.
    pub busy_poll: Duration,
    /// Pause before the next poll when nothing was new.
    pub idle_poll: Duration,
}

impl Default for WatchTimings {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(350),
            busy_poll: Duration::from_secs(1),
            idle_poll: Duration::from_secs(2),
        }
    }
}

impl WatchTimings {
    /// Returns default poll pauses with the given reply delay.
    #[must_use]
    pub fn with_reply_delay(reply_delay: Duration) -> Self {
        Self {
            reply_delay,
            ..Self::default()
        }
    }
}

/// Service-level errors for watcher operations.
#[derive(Debug, Error)]
pub enum WatchServiceError {
    /// Watcher validation failed.
    #[error(transparent)]
    Domain(#[from] WatchDomainError),
    /// The post id was rejected.
    #[error(transparent)]
    Social(#[from] SocialDomainError),
    /// The API client could not be opened.
    #[error(transparent)]
    Api(#[from] SocialApiError),
    /// The request cannot be served.
    #[error("invalid watch request: {0}")]
    Validation(String),
    /// Watcher state is unavailable.
    #[error("watcher registry unavailable: {0}")]
    Unavailable(String),
}

/// Result type for watcher operations.
pub type WatchServiceResult<T> = Result<T, WatchServiceError>;

type WatchMap = Arc<RwLock<HashMap<WatchId, WatchState>>>;

/// Starts, stops and reports auto-reply watchers.
pub struct WatchService<F, C>
where
    F: SocialApiFactory,
    C: Clock + Send + Sync,
{
    factory: Arc<F>,
    clock: Arc<C>,
    timings: WatchTimings,
    watchers: WatchMap,
    jobs: Arc<Mutex<HashMap<WatchId, JoinHandle<()>>>>,
}

impl<F, C> WatchService<F, C>
where
    F: SocialApiFactory,
    C: Clock + Send + Sync,
{
    /// Creates a service with no watchers.
    #[must_use]
    pub fn new(factory: Arc<F>, clock: Arc<C>, timings: WatchTimings) -> Self {
        Self {
            factory,
            clock,
            timings,
            watchers: Arc::default(),
            jobs: Arc::default(),
        }
    }

    /// Starts watching `post_id` and answering new comments with `message`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchServiceError`] without credentials, for an invalid post
    /// id or blank message, or when the client cannot be opened.
    pub fn start(
        &self,
        post_id: i64,
        message: &str,
        credentials: Option<&CommunityCredentials>,
    ) -> WatchServiceResult<WatchState> {
        let credentials = credentials.ok_or_else(|| {
            WatchServiceError::Validation("no active community is configured".to_owned())
        })?;
        let post_id = PostId::new(post_id)?;
        let state = WatchState::new(post_id, message, &*self.clock)?;
        let api = Arc::new(self.factory.connect(credentials)?);

        let watch_id = state.id().clone();
        self.watchers
            .write()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?
            .insert(watch_id.clone(), state.clone());

        let watch = Arc::new(WatchLoop {
            watch_id: watch_id.clone(),
            post_id,
            message: state.message().to_owned(),
            api,
            watchers: Arc::clone(&self.watchers),
            timings: self.timings,
        });
        let handle = tokio::spawn(watch.run());
        self.jobs
            .lock()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?
            .insert(watch_id.clone(), handle);

        info!(watch_id = %watch_id, post_id = %post_id, "watcher started");
        Ok(state)
    }

    /// Asks a watcher to stop. Returns `false` for unknown or already
    /// stopped watchers.
    ///
    /// # Errors
    ///
    /// Returns [`WatchServiceError::Unavailable`] when the lock is poisoned.
    pub fn stop(&self, watch_id: &WatchId) -> WatchServiceResult<bool> {
        let mut watchers = self
            .watchers
            .write()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?;
        Ok(watchers
            .get_mut(watch_id)
            .is_some_and(WatchState::request_stop))
    }

    /// Returns every watcher, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`WatchServiceError::Unavailable`] when the lock is poisoned.
    pub fn list(&self) -> WatchServiceResult<Vec<WatchState>> {
        let watchers = self
            .watchers
            .read()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?;
        let mut states: Vec<WatchState> = watchers.values().cloned().collect();
        states.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(states)
    }

    /// Returns one watcher.
    ///
    /// # Errors
    ///
    /// Returns [`WatchServiceError::Unavailable`] when the lock is poisoned.
    pub fn get(&self, watch_id: &WatchId) -> WatchServiceResult<Option<WatchState>> {
        let watchers = self
            .watchers
            .read()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?;
        Ok(watchers.get(watch_id).cloned())
    }

    /// Waits for a watcher loop to exit. Returns `false` when no loop is
    /// pending for the id.
    ///
    /// # Errors
    ///
    /// Returns [`WatchServiceError::Unavailable`] when the lock is poisoned.
    pub async fn wait(&self, watch_id: &WatchId) -> WatchServiceResult<bool> {
        let job = self
            .jobs
            .lock()
            .map_err(|err| WatchServiceError::Unavailable(err.to_string()))?
            .remove(watch_id);
        let Some(job) = job else {
            return Ok(false);
        };
        if let Err(err) = job.await {
            warn!(watch_id = %watch_id, error = %err, "watcher job ended abnormally");
        }
        Ok(true)
    }
}

struct WatchLoop<A>
where
    A: SocialApi,
{
    watch_id: WatchId,
    post_id: PostId,
    message: String,
    api: Arc<A>,
    watchers: WatchMap,
    timings: WatchTimings,
}

impl<A> WatchLoop<A>
where
    A: SocialApi + 'static,
{
    async fn run(self: Arc<Self>) {
        let outcome = tokio::spawn(Arc::clone(&self).poll()).await;
        self.api.close().await;
        if let Err(err) = outcome {
            warn!(watch_id = %self.watch_id, error = %err, "watcher loop aborted");
            self.update(|state| state.note(format!("Watcher aborted: {err}")));
        }
        self.update(WatchState::finish);
        info!(watch_id = %self.watch_id, "watcher stopped");
    }

    async fn poll(self: Arc<Self>) {
        self.update(|state| state.note("Watcher started, reading the latest comments"));
        match self.api.recent_comments(self.post_id, INITIAL_SCAN).await {
            Ok(comments) => {
                self.update(|state| state.skip_existing(&comments));
            }
            Err(err) => {
                self.update(|state| state.note(format!("Initial read failed: {err}")));
            }
        }

        while self.is_running() {
            let comments = match self.api.recent_comments(self.post_id, POLL_BATCH).await {
                Ok(comments) => comments,
                Err(err) => {
                    warn!(watch_id = %self.watch_id, error = %err, "comment poll failed");
                    self.update(|state| state.record_read_error(&err));
                    tokio::time::sleep(self.timings.reply_delay).await;
                    continue;
                }
            };

            let fresh = self
                .update(|state| state.take_new(&comments))
                .unwrap_or_default();
            for comment in &fresh {
                let delivered = self
                    .api
                    .send_reply(self.post_id, comment.id, &self.message)
                    .await;
                self.update(|state| state.record_reply(comment.id, delivered));
                tokio::time::sleep(self.timings.reply_delay).await;
            }

            let pause = if fresh.is_empty() {
                self.timings.idle_poll
            } else {
                self.timings.busy_poll
            };
            tokio::time::sleep(pause).await;
        }
    }

    fn is_running(&self) -> bool {
        self.watchers.read().is_ok_and(|watchers| {
            watchers
                .get(&self.watch_id)
                .is_some_and(WatchState::is_running)
        })
    }

    fn update<R>(&self, mutation: impl FnOnce(&mut WatchState) -> R) -> Option<R> {
        match self.watchers.write() {
            Ok(mut watchers) => watchers.get_mut(&self.watch_id).map(mutation),
            Err(err) => {
                warn!(watch_id = %self.watch_id, error = %err, "watcher state unavailable");
                None
            }
        }
    }
}
