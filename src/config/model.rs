//! Configuration model.

use super::ConfigError;
use crate::campaign::services::CampaignSettings;
use crate::social::domain::{CommunityCredentials, GroupId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Pause between consecutive API calls, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RequestDelay(f64);

impl RequestDelay {
    /// Smallest accepted delay.
    pub const MIN_SECONDS: f64 = 0.05;
    /// Largest accepted delay.
    pub const MAX_SECONDS: f64 = 30.0;
    const DEFAULT_SECONDS: f64 = 0.35;

    /// Creates a validated delay.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DelayOutOfRange`] outside `[0.05, 30]` seconds.
    pub fn from_secs(seconds: f64) -> Result<Self, ConfigError> {
        if (Self::MIN_SECONDS..=Self::MAX_SECONDS).contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(ConfigError::DelayOutOfRange {
                value: seconds,
                min: Self::MIN_SECONDS,
                max: Self::MAX_SECONDS,
            })
        }
    }

    /// Returns the delay in seconds.
    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Returns the delay as a [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

impl Default for RequestDelay {
    fn default() -> Self {
        Self(Self::DEFAULT_SECONDS)
    }
}

impl TryFrom<f64> for RequestDelay {
    type Error = ConfigError;

    fn try_from(seconds: f64) -> Result<Self, Self::Error> {
        Self::from_secs(seconds)
    }
}

impl From<RequestDelay> for f64 {
    fn from(delay: RequestDelay) -> Self {
        delay.0
    }
}

/// One community the bot can act for.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Display label.
    #[serde(default)]
    pub name: String,
    /// Community id without the minus sign.
    pub group_id: i64,
    /// User token used to read comments.
    #[serde(default)]
    pub user_token: String,
    /// Community token used to post replies.
    #[serde(default)]
    pub group_token: String,
}

impl Community {
    /// Resolves API credentials; `None` when a token is blank or the id is
    /// invalid.
    #[must_use]
    pub fn credentials(&self) -> Option<CommunityCredentials> {
        let group_id = GroupId::new(self.group_id).ok()?;
        CommunityCredentials::new(group_id, &self.user_token, &self.group_token).ok()
    }
}

impl fmt::Debug for Community {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Community")
            .field("name", &self.name)
            .field("group_id", &self.group_id)
            .field("user_token", &"<redacted>")
            .field("group_token", &"<redacted>")
            .finish()
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Configured communities.
    pub communities: Vec<Community>,
    /// Community used for campaigns; the first one when unset.
    pub active_group_id: Option<i64>,
    /// Pause between API calls.
    pub request_delay: RequestDelay,
    /// Default reply text.
    pub promo_message: String,
    /// Posts selected for the next campaign.
    pub post_ids: Vec<i64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            communities: Vec::new(),
            active_group_id: None,
            request_delay: RequestDelay::default(),
            promo_message: "Thanks for your comment!".to_owned(),
            post_ids: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Checks every rule and reports all violations at once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] listing each violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.promo_message.trim().is_empty() {
            errors.push("promo_message must not be empty".to_owned());
        }

        let mut seen = HashSet::new();
        for community in &self.communities {
            if community.group_id <= 0 {
                errors.push(format!(
                    "community `{}` has non-positive group_id {}",
                    community.name, community.group_id
                ));
            }
            if !seen.insert(community.group_id) {
                errors.push(format!("group_id {} is configured twice", community.group_id));
            }
        }

        if let Some(active) = self.active_group_id
            && !seen.contains(&active)
        {
            errors.push(format!("active_group_id {active} names no configured community"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Returns the active community.
    #[must_use]
    pub fn active_community(&self) -> Option<&Community> {
        match self.active_group_id {
            Some(group_id) => self
                .communities
                .iter()
                .find(|community| community.group_id == group_id),
            None => self.communities.first(),
        }
    }

    /// Returns credentials of the active community, `None` when there is
    /// no usable one.
    #[must_use]
    pub fn active_credentials(&self) -> Option<CommunityCredentials> {
        self.active_community().and_then(Community::credentials)
    }

    /// Makes `group_id` the active community.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCommunity`] when it is not configured.
    pub fn set_active_community(&mut self, group_id: i64) -> Result<(), ConfigError> {
        if !self
            .communities
            .iter()
            .any(|community| community.group_id == group_id)
        {
            return Err(ConfigError::UnknownCommunity(group_id));
        }
        self.active_group_id = Some(group_id);
        Ok(())
    }

    /// Returns the campaign tunables derived from this configuration.
    #[must_use]
    pub fn campaign_settings(&self) -> CampaignSettings {
        CampaignSettings {
            request_delay: self.request_delay.as_duration(),
            default_message: self.promo_message.clone(),
        }
    }
}
