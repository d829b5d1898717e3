//! Watch identifiers.

use super::WatchDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const WATCH_ID_LENGTH: usize = 8;

/// Short opaque token identifying one watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(String);

impl WatchId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(token[..WATCH_ID_LENGTH].to_owned())
    }

    /// Parses a caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WatchDomainError::InvalidWatchId`] unless the value is a
    /// lowercase hex token of exactly eight characters.
    pub fn parse(value: &str) -> Result<Self, WatchDomainError> {
        let trimmed = value.trim();
        if trimmed.len() == WATCH_ID_LENGTH
            && trimmed
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
        {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(WatchDomainError::InvalidWatchId(value.to_owned()))
        }
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
