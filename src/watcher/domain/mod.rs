//! Domain model for comment watchers.

mod error;
mod ids;
mod state;

pub use error::WatchDomainError;
pub use ids::WatchId;
pub use state::{WATCH_LOG_CAPACITY, WatchState, WatchStatus};
