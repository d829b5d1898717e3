//! Error types for social domain validation.

use thiserror::Error;

/// Errors returned while constructing social domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocialDomainError {
    /// Group identifiers must be positive.
    #[error("invalid group id {0}, expected a positive integer")]
    InvalidGroupId(i64),

    /// Post identifiers must be positive.
    #[error("invalid post id {0}, expected a positive integer")]
    InvalidPostId(i64),

    /// User identifiers must be positive.
    #[error("invalid user id {0}, expected a positive integer")]
    InvalidUserId(i64),

    /// Access tokens must not be blank.
    #[error("{0} token must not be empty")]
    EmptyToken(&'static str),
}
