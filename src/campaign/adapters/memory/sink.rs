//! Progress sink that records events for assertions.

use crate::campaign::{
    domain::ProgressEvent,
    ports::{ProgressSink, ProgressSinkError, ProgressSinkResult},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Thread-safe sink collecting every emitted event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
    reject_after: Option<usize>,
}

impl RecordingProgressSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that accepts `accepted` events and rejects the rest.
    #[must_use]
    pub fn rejecting_after(accepted: usize) -> Self {
        Self {
            events: Arc::default(),
            reject_after: Some(accepted),
        }
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgressSink {
    async fn emit(&self, event: ProgressEvent) -> ProgressSinkResult<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|err| ProgressSinkError::Unavailable(err.to_string()))?;
        if self.reject_after.is_some_and(|limit| events.len() >= limit) {
            return Err(ProgressSinkError::Unavailable(format!(
                "sink closed after {} events",
                events.len()
            )));
        }
        events.push(event);
        Ok(())
    }
}
