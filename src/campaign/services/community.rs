//! Community metadata lookups with a durable cache.

use crate::campaign::ports::{CampaignStore, CampaignStoreError};
use crate::social::{
    domain::{CommunityCredentials, GroupId, GroupInfo, PostDetails, PostId},
    ports::{SocialApi, SocialApiError, SocialApiFactory},
};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Age after which cached community metadata is refreshed.
pub const GROUP_CACHE_MAX_AGE: TimeDelta = TimeDelta::hours(1);

/// Upper bound of a post listing request.
pub const MAX_POST_LISTING: u64 = 100;

/// Errors returned by [`CommunityInfoService`].
#[derive(Debug, Error)]
pub enum CommunityInfoError {
    /// The API call failed and nothing was cached.
    #[error(transparent)]
    Api(#[from] SocialApiError),

    /// Reading the cache failed.
    #[error(transparent)]
    Store(#[from] CampaignStoreError),

    /// The API returned no community and nothing was cached.
    #[error("community {0} not found")]
    GroupNotFound(GroupId),
}

/// Result type for community lookups.
pub type CommunityInfoResult<T> = Result<T, CommunityInfoError>;

/// Reads metadata of one community, opening a client per call.
#[derive(Clone)]
pub struct CommunityInfoService<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    factory: Arc<F>,
    store: Arc<S>,
    clock: Arc<C>,
    credentials: CommunityCredentials,
}

impl<F, S, C> CommunityInfoService<F, S, C>
where
    F: SocialApiFactory,
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    /// Creates a service bound to one community.
    #[must_use]
    pub const fn new(
        factory: Arc<F>,
        store: Arc<S>,
        clock: Arc<C>,
        credentials: CommunityCredentials,
    ) -> Self {
        Self {
            factory,
            store,
            clock,
            credentials,
        }
    }

    /// Returns community metadata.
    ///
    /// A cached record younger than [`GROUP_CACHE_MAX_AGE`] is returned
    /// without calling the API. Otherwise the record is fetched and cached;
    /// when the fetch fails, a stale cached record is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityInfoError`] when the fetch fails and nothing is
    /// cached.
    pub async fn group_info(&self) -> CommunityInfoResult<GroupInfo> {
        let group_id = self.credentials.group_id();
        let cached = self.store.find_group_info(group_id).await?;
        let now = self.clock.utc();
        if let Some(entry) = cached.as_ref().filter(|entry| entry.is_fresh(now, GROUP_CACHE_MAX_AGE))
        {
            return Ok(entry.info.clone());
        }

        let fetched = self.with_api(|api| async move { api.get_group().await }).await;
        match (fetched, cached) {
            (Ok(Some(info)), _) => {
                if let Err(err) = self.store.upsert_group_info(&info, now).await {
                    warn!(group_id = %group_id, error = %err, "group cache write failed");
                }
                Ok(info)
            }
            (Ok(None), Some(stale)) => Ok(stale.info),
            (Ok(None), None) => Err(CommunityInfoError::GroupNotFound(group_id)),
            (Err(err), Some(stale)) => {
                warn!(group_id = %group_id, error = %err, "serving stale group info");
                Ok(stale.info)
            }
            (Err(err), None) => Err(err.into()),
        }
    }

    /// Fetches one post with its counters.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityInfoError::Api`] when the fetch fails.
    pub async fn post_details(&self, post_id: PostId) -> CommunityInfoResult<Option<PostDetails>> {
        Ok(self
            .with_api(|api| async move { api.get_post(post_id).await })
            .await?)
    }

    /// Lists the newest wall posts; `limit` is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityInfoError::Api`] when the fetch fails.
    pub async fn list_posts(&self, limit: u64) -> CommunityInfoResult<Vec<PostDetails>> {
        let limit = limit.clamp(1, MAX_POST_LISTING);
        Ok(self
            .with_api(|api| async move { api.list_posts(limit).await })
            .await?)
    }

    async fn with_api<T, Fut>(
        &self,
        call: impl FnOnce(Arc<F::Api>) -> Fut,
    ) -> Result<T, SocialApiError>
    where
        Fut: Future<Output = Result<T, SocialApiError>>,
    {
        let api = Arc::new(self.factory.connect(&self.credentials)?);
        let result = call(Arc::clone(&api)).await;
        api.close().await;
        result
    }
}
