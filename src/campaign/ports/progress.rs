//! Sink port receiving pipeline progress events.

use crate::campaign::{domain::CampaignDomainError, domain::ProgressEvent, ports::CampaignStoreError};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for progress sink operations.
pub type ProgressSinkResult<T> = Result<T, ProgressSinkError>;

/// Receives progress events in the order the pipeline produces them.
///
/// A sink error escapes the pipeline and fails the campaign.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressSinkError`] when the event cannot be recorded.
    async fn emit(&self, event: ProgressEvent) -> ProgressSinkResult<()>;
}

/// Errors returned by progress sinks.
#[derive(Debug, Clone, Error)]
pub enum ProgressSinkError {
    /// The event violates the task lifecycle.
    #[error(transparent)]
    Domain(#[from] CampaignDomainError),

    /// The durable write failed.
    #[error(transparent)]
    Store(#[from] CampaignStoreError),

    /// The sink's backing state is unavailable.
    #[error("progress sink unavailable: {0}")]
    Unavailable(String),
}
