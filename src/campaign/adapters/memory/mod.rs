//! In-memory adapters for campaign ports.

mod sink;
mod store;

pub use sink::RecordingProgressSink;
pub use store::InMemoryCampaignStore;
