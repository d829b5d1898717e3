//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or did not match the schema.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The merged values violate one or more rules.
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// No configured community has this id.
    #[error("community {0} is not configured")]
    UnknownCommunity(i64),

    /// The request delay is outside the accepted range.
    #[error("request delay must be between {min} and {max} seconds, got {value}")]
    DelayOutOfRange {
        /// Rejected value in seconds.
        value: f64,
        /// Lower bound in seconds.
        min: f64,
        /// Upper bound in seconds.
        max: f64,
    },

    /// Serializing the configuration failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Writing the configuration file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
