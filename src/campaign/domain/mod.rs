//! Domain model for campaign orchestration.
//!
//! The campaign domain models the task aggregate and its lifecycle state
//! machine, the progress events that drive it, and the cross-post recipient
//! set, while keeping all I/O outside of the domain boundary.

mod error;
mod event;
mod history;
mod ids;
mod log;
mod recipients;
mod status;
mod task;

pub use error::{CampaignDomainError, ParseCampaignStatusError, ParseSendOutcomeError};
pub use event::{ProgressEvent, SendCounters};
pub use history::{
    CachedGroupInfo, CampaignHistoryEntry, CampaignStats, PostStatsRecord, SendOutcome,
};
pub use ids::TaskId;
pub use log::{TASK_LOG_CAPACITY, TaskLog};
pub use recipients::{CommentatorRecord, RecipientSet};
pub use status::CampaignStatus;
pub use task::{AppliedEvent, CampaignTask, PersistedCampaignData, TaskChanges};
