//! Auto-reply watcher: answers new comments under one post until stopped.
//!
//! A simpler sibling of the campaign engine with no deduplication and no
//! completion state. It reuses the social API port and the same pacing.

pub mod domain;
pub mod services;
