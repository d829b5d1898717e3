//! Identifier types for the campaign domain.

use super::CampaignDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of generated task identifiers.
const TASK_ID_LENGTH: usize = 8;

/// Short opaque token identifying one campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(
            Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(TASK_ID_LENGTH)
                .collect(),
        )
    }

    /// Parses an identifier received from a caller or from storage.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignDomainError::InvalidTaskId`] unless the value is a
    /// non-empty lowercase hex token of at most 32 characters.
    pub fn parse(value: &str) -> Result<Self, CampaignDomainError> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.len() <= 32
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        if !is_valid {
            return Err(CampaignDomainError::InvalidTaskId(value.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
