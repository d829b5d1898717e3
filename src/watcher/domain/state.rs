//! Watcher state and its two-state lifecycle.

use super::{WatchDomainError, WatchId};
use crate::campaign::domain::TaskLog;
use crate::social::domain::{Comment, CommentId, PostId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of lines a watcher keeps.
pub const WATCH_LOG_CAPACITY: usize = 50;

/// Lifecycle status of a watcher. `stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Polling for new comments.
    Running,
    /// Stopped on request or after its loop ended.
    Stopped,
}

impl WatchStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Observable state of one watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchState {
    id: WatchId,
    post_id: PostId,
    message: String,
    status: WatchStatus,
    created_at: DateTime<Utc>,
    replied: u64,
    errors: u64,
    last_seen_comment: Option<CommentId>,
    log: TaskLog,
}

impl WatchState {
    /// Creates a running watcher.
    ///
    /// # Errors
    ///
    /// Returns [`WatchDomainError::EmptyMessage`] when the text is blank.
    pub fn new(
        post_id: PostId,
        message: &str,
        clock: &impl Clock,
    ) -> Result<Self, WatchDomainError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(WatchDomainError::EmptyMessage);
        }
        Ok(Self {
            id: WatchId::new(),
            post_id,
            message: trimmed.to_owned(),
            status: WatchStatus::Running,
            created_at: clock.utc(),
            replied: 0,
            errors: 0,
            last_seen_comment: None,
            log: TaskLog::with_capacity(WATCH_LOG_CAPACITY),
        })
    }

    /// Returns the watcher identifier.
    #[must_use]
    pub const fn id(&self) -> &WatchId {
        &self.id
    }

    /// Returns the watched post.
    #[must_use]
    pub const fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Returns the reply text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> WatchStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the number of delivered replies.
    #[must_use]
    pub const fn replied(&self) -> u64 {
        self.replied
    }

    /// Returns the number of failed reads and replies.
    #[must_use]
    pub const fn errors(&self) -> u64 {
        self.errors
    }

    /// Returns the highest comment id already handled.
    #[must_use]
    pub const fn last_seen_comment(&self) -> Option<CommentId> {
        self.last_seen_comment
    }

    /// Returns the bounded log.
    #[must_use]
    pub const fn log(&self) -> &TaskLog {
        &self.log
    }

    /// Returns whether the loop should keep polling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == WatchStatus::Running
    }

    /// Appends a line to the log.
    pub fn note(&mut self, line: impl Into<String>) {
        self.log.push(line);
    }

    /// Marks existing comments as seen so they are never answered.
    pub fn skip_existing(&mut self, comments: &[Comment]) {
        if let Some(highest) = comments.iter().map(|comment| comment.id).max() {
            self.raise_high_water_mark(highest);
        }
        self.note(format!("Skipped {} existing comments", comments.len()));
    }

    /// Returns the comments above the high-water mark in ascending id order
    /// and advances the mark past them.
    pub fn take_new(&mut self, comments: &[Comment]) -> Vec<Comment> {
        let mut fresh: Vec<Comment> = comments
            .iter()
            .filter(|comment| self.last_seen_comment.is_none_or(|seen| comment.id > seen))
            .copied()
            .collect();
        fresh.sort_by_key(|comment| comment.id);
        if let Some(last) = fresh.last() {
            self.raise_high_water_mark(last.id);
        }
        fresh
    }

    /// Records the outcome of one reply.
    pub fn record_reply(&mut self, comment_id: CommentId, delivered: bool) {
        if delivered {
            self.replied += 1;
            self.note(format!("Replied to comment {comment_id}"));
        } else {
            self.errors += 1;
            self.note(format!("Failed to reply to comment {comment_id}"));
        }
    }

    /// Records a failed comment read.
    pub fn record_read_error(&mut self, error: impl fmt::Display) {
        self.errors += 1;
        self.note(format!("Failed to read comments: {error}"));
    }

    /// Requests a cooperative stop. Returns `false` when already stopped.
    pub fn request_stop(&mut self) -> bool {
        if self.status == WatchStatus::Stopped {
            return false;
        }
        self.status = WatchStatus::Stopped;
        self.note("Stop requested");
        true
    }

    /// Marks the loop as ended.
    pub fn finish(&mut self) {
        self.status = WatchStatus::Stopped;
        self.note("Watcher stopped");
    }

    fn raise_high_water_mark(&mut self, candidate: CommentId) {
        self.last_seen_comment = Some(
            self.last_seen_comment
                .map_or(candidate, |seen| seen.max(candidate)),
        );
    }
}
