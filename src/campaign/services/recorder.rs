//! Progress sink that drives the task aggregate and its durable row.

use super::TaskRegistry;
use crate::campaign::{
    domain::{CampaignHistoryEntry, ProgressEvent, TaskId},
    ports::{CampaignStore, ProgressSink, ProgressSinkError, ProgressSinkResult},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies each event to the live task, then writes the changed fields and,
/// for send attempts, one history row.
///
/// The in-memory mutation happens first; a crash before the durable write
/// loses that write only.
pub struct TaskProgressRecorder<S, C>
where
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    task_id: TaskId,
    registry: TaskRegistry,
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskProgressRecorder<S, C>
where
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    /// Creates a recorder for one task.
    #[must_use]
    pub const fn new(task_id: TaskId, registry: TaskRegistry, store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            task_id,
            registry,
            store,
            clock,
        }
    }

    fn trace(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Error { message } => {
                warn!(task_id = %self.task_id, error = %message, "campaign step failed");
            }
            ProgressEvent::SendAttempt {
                user_id, counters, ..
            } => {
                debug!(
                    task_id = %self.task_id,
                    user_id = %user_id,
                    sent = counters.sent,
                    failed = counters.failed,
                    "reply attempted"
                );
            }
            other => info!(task_id = %self.task_id, stage = other.kind(), "{other}"),
        }
    }
}

#[async_trait]
impl<S, C> ProgressSink for TaskProgressRecorder<S, C>
where
    S: CampaignStore,
    C: Clock + Send + Sync,
{
    async fn emit(&self, event: ProgressEvent) -> ProgressSinkResult<()> {
        self.trace(&event);
        let applied = self
            .registry
            .update(&self.task_id, |task| task.apply_event(&event, &*self.clock))
            .map_err(|err| ProgressSinkError::Unavailable(err.to_string()))??;

        self.store
            .update_task(&self.task_id, &applied.changes)
            .await?;

        if let (
            Some(outcome),
            ProgressEvent::SendAttempt {
                user_id,
                post_id,
                comment_id,
                ..
            },
        ) = (applied.outcome, &event)
        {
            let entry = CampaignHistoryEntry::new(
                self.task_id.clone(),
                *user_id,
                *post_id,
                *comment_id,
                outcome,
                self.clock.utc(),
            );
            self.store.append_history(&entry).await?;
        }
        Ok(())
    }
}
