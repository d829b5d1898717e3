//! Identifier types for the social domain.

use super::SocialDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $error:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns an error when the value is zero or negative.
            pub fn new(value: i64) -> Result<Self, SocialDomainError> {
                match u64::try_from(value) {
                    Ok(inner) if inner > 0 => Ok(Self(inner)),
                    _ => Err(SocialDomainError::$error(value)),
                }
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// Positive identifier of a community (group). The wall owner id used by
    /// the API is its negation, see [`GroupId::owner_id`].
    GroupId,
    InvalidGroupId
);

positive_id!(
    /// Identifier of a wall post within its community.
    PostId,
    InvalidPostId
);

positive_id!(
    /// Identifier of a person. Communities and deleted accounts never map to
    /// a `UserId`.
    UserId,
    InvalidUserId
);

impl GroupId {
    /// Returns the wall owner id, which is negative for communities.
    #[must_use]
    pub fn owner_id(self) -> i64 {
        i64::try_from(self.0).map_or(i64::MIN, |value| -value)
    }
}

impl UserId {
    /// Maps a comment author id to a user, rejecting communities (negative
    /// ids) and deleted or anonymous authors (zero).
    #[must_use]
    pub fn from_author(author_id: i64) -> Option<Self> {
        Self::new(author_id).ok()
    }
}

/// Identifier of a comment on a wall post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(u64);

impl CommentId {
    /// Wraps a raw comment identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
