//! Credentials for acting on behalf of one community.

use super::{GroupId, SocialDomainError};
use std::fmt;

/// Resolved credentials of the active community.
///
/// The user token reads walls and comments; the group token posts replies.
#[derive(Clone, PartialEq, Eq)]
pub struct CommunityCredentials {
    group_id: GroupId,
    user_token: String,
    group_token: String,
}

impl CommunityCredentials {
    /// Creates validated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SocialDomainError::EmptyToken`] when either token is blank.
    pub fn new(
        group_id: GroupId,
        user_token: impl Into<String>,
        group_token: impl Into<String>,
    ) -> Result<Self, SocialDomainError> {
        let user = user_token.into().trim().to_owned();
        let group = group_token.into().trim().to_owned();
        if user.is_empty() {
            return Err(SocialDomainError::EmptyToken("user"));
        }
        if group.is_empty() {
            return Err(SocialDomainError::EmptyToken("group"));
        }
        Ok(Self {
            group_id,
            user_token: user,
            group_token: group,
        })
    }

    /// Returns the community identifier.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the token used for read operations.
    #[must_use]
    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    /// Returns the token used to post replies.
    #[must_use]
    pub fn group_token(&self) -> &str {
        &self.group_token
    }
}

impl fmt::Debug for CommunityCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommunityCredentials")
            .field("group_id", &self.group_id)
            .field("user_token", &"<redacted>")
            .field("group_token", &"<redacted>")
            .finish()
    }
}
