//! Campaign lifecycle state machine.

use super::ParseCampaignStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a campaign task.
///
/// `pending -> collecting -> sending -> completed`, with `failed` reachable
/// from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Task has been accepted but the pipeline has not started.
    Pending,
    /// Comments of the target posts are being read.
    Collecting,
    /// Replies are being sent.
    Sending,
    /// Every recipient has been attempted.
    Completed,
    /// The pipeline stopped on an unrecoverable error.
    Failed,
}

impl CampaignStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Collecting => "collecting",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no transition can leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Collecting)
                | (Self::Collecting, Self::Sending)
                | (Self::Sending, Self::Completed)
                | (Self::Pending | Self::Collecting | Self::Sending, Self::Failed)
        )
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CampaignStatus {
    type Error = ParseCampaignStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "collecting" => Ok(Self::Collecting),
            "sending" => Ok(Self::Sending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseCampaignStatusError(value.to_owned())),
        }
    }
}
