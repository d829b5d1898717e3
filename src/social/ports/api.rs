//! API port for reading comments and posting replies.

use crate::social::domain::{
    Comment, CommentId, CommunityCredentials, GroupInfo, PostDetails, PostId, UserId, UserProfile,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for social API operations.
pub type SocialApiResult<T> = Result<T, SocialApiError>;

/// Client handle bound to one community.
///
/// Every call is a suspension point and may fail; no call retries on its
/// own. Handles are released with [`SocialApi::close`] once the owning
/// campaign or watcher finishes.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Lists one page of comments under a post in thread order.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn list_comments(
        &self,
        post_id: PostId,
        offset: u64,
        count: u64,
    ) -> SocialApiResult<Vec<Comment>>;

    /// Lists the newest comments under a post, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn recent_comments(&self, post_id: PostId, count: u64) -> SocialApiResult<Vec<Comment>>;

    /// Posts `text` as a reply threaded under `parent`.
    ///
    /// Never fails: every error class collapses to `false`.
    async fn send_reply(&self, post_id: PostId, parent: CommentId, text: &str) -> bool;

    /// Fetches profiles for up to 100 users.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn get_users(&self, user_ids: &[UserId]) -> SocialApiResult<Vec<UserProfile>>;

    /// Fetches one post with its counters, `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn get_post(&self, post_id: PostId) -> SocialApiResult<Option<PostDetails>>;

    /// Fetches metadata of the bound community.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn get_group(&self) -> SocialApiResult<Option<GroupInfo>>;

    /// Lists the newest wall posts of the bound community.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the request fails.
    async fn list_posts(&self, limit: u64) -> SocialApiResult<Vec<PostDetails>>;

    /// Releases the handle. Later calls fail with a permanent error.
    async fn close(&self);
}

/// Creates client handles for a community.
pub trait SocialApiFactory: Send + Sync + 'static {
    /// Client type produced by this factory.
    type Api: SocialApi + 'static;

    /// Opens a client bound to the given community.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError`] when the client cannot be constructed.
    fn connect(&self, credentials: &CommunityCredentials) -> SocialApiResult<Self::Api>;
}

/// Errors returned by social API adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocialApiError {
    /// Network failure, timeout or rate limit; retrying may succeed.
    #[error("transient API error: {0}")]
    Transient(String),

    /// Authentication, permission or validation failure.
    #[error("API error: {0}")]
    Permanent(String),
}

impl SocialApiError {
    /// Builds a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Builds a permanent error.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// Returns whether retrying the call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
