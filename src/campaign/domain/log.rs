//! Bounded, human-readable task log.

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Number of lines a campaign task keeps.
pub const TASK_LOG_CAPACITY: usize = 80;

/// Ordered log that evicts its oldest line once full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLog {
    capacity: usize,
    lines: VecDeque<String>,
}

impl TaskLog {
    /// Creates an empty log holding at most `capacity` lines.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Restores a log from persisted lines, keeping only the newest ones.
    #[must_use]
    pub fn from_lines(capacity: usize, lines: impl IntoIterator<Item = String>) -> Self {
        let mut log = Self::with_capacity(capacity);
        for line in lines {
            log.push(line);
        }
        log
    }

    /// Appends a line, evicting the oldest one when the log is full.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Returns the lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// Returns the most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Returns the number of lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns whether the log holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns whether any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl Default for TaskLog {
    fn default() -> Self {
        Self::with_capacity(TASK_LOG_CAPACITY)
    }
}

impl Serialize for TaskLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.lines)
    }
}
