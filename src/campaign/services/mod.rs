//! Application services for campaign orchestration.

mod collector;
mod community;
mod orchestrator;
mod recorder;
mod registry;
mod sender;

pub use collector::{COMMENT_PAGE_SIZE, CommentCollector, collect_recipients};
pub use community::{
    CommunityInfoError, CommunityInfoResult, CommunityInfoService, GROUP_CACHE_MAX_AGE,
    MAX_POST_LISTING,
};
pub use orchestrator::{
    CampaignService, CampaignServiceError, CampaignServiceResult, CampaignSettings,
    PipelineError, SubmitCampaignRequest,
};
pub use recorder::TaskProgressRecorder;
pub use registry::{RegistryError, TaskRegistry};
pub use sender::{PROFILE_BATCH_SIZE, ReplySender};
