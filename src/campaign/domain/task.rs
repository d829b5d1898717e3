//! Campaign task aggregate root.

use super::{
    CampaignDomainError, CampaignStatus, ProgressEvent, SendCounters, SendOutcome, TaskId,
    TaskLog,
};
use crate::social::domain::PostId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::collections::HashSet;

/// Log line written when the pipeline starts.
const START_LOG_LINE: &str = "Campaign started, reading comments of the selected posts";

/// Campaign task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignTask {
    id: TaskId,
    status: CampaignStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    post_ids: Vec<PostId>,
    message: String,
    counters: SendCounters,
    log: TaskLog,
    error: Option<String>,
}

/// Parameter object for reconstructing a persisted campaign task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCampaignData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted lifecycle status.
    pub status: CampaignStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted target posts.
    pub post_ids: Vec<PostId>,
    /// Persisted reply text.
    pub message: String,
    /// Persisted counters.
    pub counters: SendCounters,
    /// Persisted log lines, oldest first.
    pub log: TaskLog,
    /// Persisted error text.
    pub error: Option<String>,
}

/// Fields changed by one aggregate mutation, in the shape of a partial
/// durable update. `status` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    /// Status after the mutation.
    pub status: CampaignStatus,
    /// New `sent` counter.
    pub sent: Option<u64>,
    /// New `failed` counter.
    pub failed: Option<u64>,
    /// New recipient total.
    pub total: Option<u64>,
    /// Full log after the mutation.
    pub log: Option<Vec<String>>,
    /// Error text.
    pub error: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskChanges {
    const fn status_only(status: CampaignStatus) -> Self {
        Self {
            status,
            sent: None,
            failed: None,
            total: None,
            log: None,
            error: None,
            completed_at: None,
        }
    }
}

/// Outcome of applying a progress event to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEvent {
    /// Fields to write to durable storage.
    pub changes: TaskChanges,
    /// Classification of a `send-attempt` event.
    pub outcome: Option<SendOutcome>,
}

impl CampaignTask {
    /// Creates a pending campaign.
    ///
    /// Duplicate post ids are dropped, keeping the first occurrence, and the
    /// message is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignDomainError::EmptyTargetPosts`] when no post is
    /// given and [`CampaignDomainError::EmptyMessage`] when the message is
    /// blank.
    pub fn new(
        post_ids: impl IntoIterator<Item = PostId>,
        message: &str,
        clock: &impl Clock,
    ) -> Result<Self, CampaignDomainError> {
        let post_ids = unique_in_order(post_ids);
        if post_ids.is_empty() {
            return Err(CampaignDomainError::EmptyTargetPosts);
        }
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(CampaignDomainError::EmptyMessage);
        }

        Ok(Self {
            id: TaskId::new(),
            status: CampaignStatus::Pending,
            created_at: clock.utc(),
            completed_at: None,
            post_ids,
            message: trimmed.to_owned(),
            counters: SendCounters::default(),
            log: TaskLog::default(),
            error: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCampaignData) -> Self {
        Self {
            id: data.id,
            status: data.status,
            created_at: data.created_at,
            completed_at: data.completed_at,
            post_ids: data.post_ids,
            message: data.message,
            counters: data.counters,
            log: data.log,
            error: data.error,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> CampaignStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the completion timestamp. Only set on normal completion.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the target posts in processing order.
    #[must_use]
    pub fn post_ids(&self) -> &[PostId] {
        &self.post_ids
    }

    /// Returns the reply text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the running counters.
    #[must_use]
    pub const fn counters(&self) -> SendCounters {
        self.counters
    }

    /// Returns the bounded log.
    #[must_use]
    pub const fn log(&self) -> &TaskLog {
        &self.log
    }

    /// Returns the error text of a failed task.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Moves a pending task into collection and logs the start.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignDomainError::InvalidStateTransition`] unless the
    /// task is pending.
    pub fn start_collecting(&mut self) -> Result<TaskChanges, CampaignDomainError> {
        self.transition_to(CampaignStatus::Collecting)?;
        self.log.push(START_LOG_LINE);
        Ok(self.changes_with_log())
    }

    /// Applies one progress event: appends its log line, advances counters
    /// and status, and classifies send attempts.
    ///
    /// A send attempt counts as delivered when it increased `sent` relative
    /// to the value recorded before the event.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignDomainError`] when the event is not valid in the
    /// current status, or when counters regress or exceed the total.
    pub fn apply_event(
        &mut self,
        event: &ProgressEvent,
        clock: &impl Clock,
    ) -> Result<AppliedEvent, CampaignDomainError> {
        let mut outcome = None;
        let mut changes = match event {
            ProgressEvent::CollectingPage { .. } | ProgressEvent::PostCollected { .. } => {
                self.ensure_status(CampaignStatus::Collecting, event)?;
                TaskChanges::status_only(self.status)
            }
            ProgressEvent::Error { .. } => {
                if self.status.is_terminal() {
                    return Err(self.unexpected(event));
                }
                TaskChanges::status_only(self.status)
            }
            ProgressEvent::SendingStarted { total } => {
                self.transition_to(CampaignStatus::Sending)?;
                self.counters = SendCounters::for_total(*total);
                TaskChanges {
                    total: Some(*total),
                    ..TaskChanges::status_only(self.status)
                }
            }
            ProgressEvent::SendAttempt { counters, .. } => {
                self.ensure_status(CampaignStatus::Sending, event)?;
                let previous_sent = self.counters.sent;
                self.advance_counters(*counters)?;
                outcome = Some(if self.counters.sent > previous_sent {
                    SendOutcome::Sent
                } else {
                    SendOutcome::Failed
                });
                self.counter_changes()
            }
            ProgressEvent::CampaignCompleted { counters } => {
                self.ensure_status(CampaignStatus::Sending, event)?;
                self.advance_counters(*counters)?;
                self.transition_to(CampaignStatus::Completed)?;
                let completed_at = clock.utc();
                self.completed_at = Some(completed_at);
                TaskChanges {
                    completed_at: Some(completed_at),
                    ..self.counter_changes()
                }
            }
        };

        self.log.push(event.to_string());
        changes.log = Some(self.log.lines());
        Ok(AppliedEvent { changes, outcome })
    }

    /// Marks the task failed, capturing `error` verbatim. Counters keep
    /// their last value and no completion time is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignDomainError::InvalidStateTransition`] when the task
    /// is already terminal.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<TaskChanges, CampaignDomainError> {
        self.transition_to(CampaignStatus::Failed)?;
        let text = error.into();
        self.log.push(text.clone());
        self.error = Some(text.clone());
        Ok(TaskChanges {
            error: Some(text),
            ..self.changes_with_log()
        })
    }

    /// Appends a free-form line to the log.
    pub fn note(&mut self, line: impl Into<String>) -> TaskChanges {
        self.log.push(line);
        self.changes_with_log()
    }

    fn transition_to(&mut self, target: CampaignStatus) -> Result<(), CampaignDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(CampaignDomainError::InvalidStateTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn ensure_status(
        &self,
        expected: CampaignStatus,
        event: &ProgressEvent,
    ) -> Result<(), CampaignDomainError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.unexpected(event))
        }
    }

    fn unexpected(&self, event: &ProgressEvent) -> CampaignDomainError {
        CampaignDomainError::UnexpectedEvent {
            task_id: self.id.clone(),
            status: self.status,
            event: event.kind(),
        }
    }

    fn advance_counters(&mut self, next: SendCounters) -> Result<(), CampaignDomainError> {
        if next.sent < self.counters.sent || next.failed < self.counters.failed {
            return Err(CampaignDomainError::CounterRegression {
                task_id: self.id.clone(),
            });
        }
        if next.total != self.counters.total || next.attempted() > self.counters.total {
            return Err(CampaignDomainError::CounterOverflow {
                task_id: self.id.clone(),
                total: self.counters.total,
            });
        }
        self.counters = next;
        Ok(())
    }

    fn counter_changes(&self) -> TaskChanges {
        TaskChanges {
            sent: Some(self.counters.sent),
            failed: Some(self.counters.failed),
            total: Some(self.counters.total),
            ..TaskChanges::status_only(self.status)
        }
    }

    fn changes_with_log(&self) -> TaskChanges {
        TaskChanges {
            log: Some(self.log.lines()),
            ..TaskChanges::status_only(self.status)
        }
    }
}

fn unique_in_order(post_ids: impl IntoIterator<Item = PostId>) -> Vec<PostId> {
    let mut seen = HashSet::new();
    post_ids
        .into_iter()
        .filter(|post_id| seen.insert(*post_id))
        .collect()
}
