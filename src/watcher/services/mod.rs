//! Application services for comment watchers.

mod watch;

pub use watch::{
    INITIAL_SCAN, POLL_BATCH, WatchService, WatchServiceError, WatchServiceResult, WatchTimings,
};
