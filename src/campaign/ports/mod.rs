//! Port contracts for campaign orchestration.
//!
//! Ports define infrastructure-agnostic interfaces used by campaign services.

pub mod progress;
pub mod store;

pub use progress::{ProgressSink, ProgressSinkError, ProgressSinkResult};
pub use store::{CampaignStore, CampaignStoreError, CampaignStoreResult};
