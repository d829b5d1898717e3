//! Port contracts for the social network API.
//!
//! Ports define infrastructure-agnostic interfaces used by campaign and
//! watcher services.

pub mod api;

pub use api::{SocialApi, SocialApiError, SocialApiFactory, SocialApiResult};
