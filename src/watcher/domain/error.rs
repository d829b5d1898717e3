//! Error types for the watcher domain.

use thiserror::Error;

/// Errors returned by watcher domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WatchDomainError {
    /// The reply text is blank.
    #[error("watch reply text must not be empty")]
    EmptyMessage,

    /// The watch identifier is malformed.
    #[error("invalid watch id: {0}")]
    InvalidWatchId(String),
}
