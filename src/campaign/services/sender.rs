//! Rate-limited reply loop.

use crate::campaign::{
    domain::{ProgressEvent, RecipientSet, SendCounters},
    ports::{CampaignStore, ProgressSink, ProgressSinkResult},
};
use crate::social::ports::SocialApi;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of users per profile lookup.
pub const PROFILE_BATCH_SIZE: usize = 100;

/// Sends one reply per recipient.
pub struct ReplySender<A, S, C>
where
    A: SocialApi + ?Sized,
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    api: Arc<A>,
    store: Arc<S>,
    clock: Arc<C>,
    delay: Duration,
}

impl<A, S, C> ReplySender<A, S, C>
where
    A: SocialApi + ?Sized,
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    /// Creates a sender sleeping `delay` after every attempt.
    #[must_use]
    pub const fn new(api: Arc<A>, store: Arc<S>, clock: Arc<C>, delay: Duration) -> Self {
        Self {
            api,
            store,
            clock,
            delay,
        }
    }

    /// Replies to every recipient in first-seen order.
    ///
    /// Emits `sending-started` with the fixed total, caches recipient
    /// profiles on a best-effort basis, then emits one `send-attempt` per
    /// recipient and a final `campaign-completed`. A rejected reply only
    /// increments `failed`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the sink rejects an event.
    pub async fn send(
        &self,
        recipients: &RecipientSet,
        message: &str,
        sink: &dyn ProgressSink,
    ) -> ProgressSinkResult<SendCounters> {
        let total = u64::try_from(recipients.len()).unwrap_or(u64::MAX);
        let mut counters = SendCounters::for_total(total);
        sink.emit(ProgressEvent::SendingStarted { total }).await?;

        self.cache_profiles(recipients).await;

        for (index, record) in (1_u64..).zip(recipients) {
            if self
                .api
                .send_reply(record.post_id, record.comment_id, message)
                .await
            {
                counters.sent += 1;
            } else {
                counters.failed += 1;
            }
            sink.emit(ProgressEvent::SendAttempt {
                index,
                user_id: record.user_id,
                post_id: record.post_id,
                comment_id: record.comment_id,
                counters,
            })
            .await?;
            tokio::time::sleep(self.delay).await;
        }

        sink.emit(ProgressEvent::CampaignCompleted { counters })
            .await?;
        Ok(counters)
    }

    async fn cache_profiles(&self, recipients: &RecipientSet) {
        let user_ids = recipients.user_ids();
        for batch in user_ids.chunks(PROFILE_BATCH_SIZE) {
            let profiles = match self.api.get_users(batch).await {
                Ok(profiles) => profiles,
                Err(err) => {
                    warn!(batch = batch.len(), error = %err, "profile lookup failed");
                    continue;
                }
            };
            let now = self.clock.utc();
            for profile in &profiles {
                if let Err(err) = self.store.upsert_user_profile(profile, now).await {
                    warn!(user_id = %profile.id, error = %err, "profile cache write failed");
                }
            }
            debug!(requested = batch.len(), cached = profiles.len(), "profiles cached");
        }
    }
}
