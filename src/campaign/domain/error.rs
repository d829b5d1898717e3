//! Error types for campaign domain validation and lifecycle rules.

use super::{CampaignStatus, TaskId};
use thiserror::Error;

/// Errors returned while constructing or mutating campaign tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CampaignDomainError {
    /// No target post remains after removing duplicates.
    #[error("at least one target post is required")]
    EmptyTargetPosts,

    /// The reply text is empty after trimming.
    #[error("reply message must not be empty")]
    EmptyMessage,

    /// The task identifier is not a lowercase hex token.
    #[error("invalid task identifier '{0}'")]
    InvalidTaskId(String),

    /// The lifecycle state machine does not allow the transition.
    #[error("invalid campaign transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: CampaignStatus,
        /// Requested status.
        to: CampaignStatus,
    },

    /// A progress event arrived in a status that cannot accept it.
    #[error("task {task_id} cannot accept {event} events while {status}")]
    UnexpectedEvent {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: CampaignStatus,
        /// Event kind.
        event: &'static str,
    },

    /// A reported counter is lower than the value already recorded.
    #[error("send counters of task {task_id} went backwards")]
    CounterRegression {
        /// Task identifier.
        task_id: TaskId,
    },

    /// Attempts exceed the recipient total, or the total changed mid-send.
    #[error("send counters of task {task_id} exceed the fixed total of {total}")]
    CounterOverflow {
        /// Task identifier.
        task_id: TaskId,
        /// Recipient total fixed when sending started.
        total: u64,
    },
}

/// Error returned while parsing campaign statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown campaign status: {0}")]
pub struct ParseCampaignStatusError(pub String);

/// Error returned while parsing send outcomes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown send outcome: {0}")]
pub struct ParseSendOutcomeError(pub String);
