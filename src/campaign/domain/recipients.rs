//! Cross-post recipient set.

use crate::social::domain::{CommentId, PostId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// A person to reply to and the comment the reply is threaded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentatorRecord {
    /// Recipient.
    pub user_id: UserId,
    /// Post holding the anchor comment.
    pub post_id: PostId,
    /// Anchor comment.
    pub comment_id: CommentId,
}

/// Insertion-ordered mapping of user to anchor comment.
///
/// The first post that contains a user wins; later occurrences of the same
/// user are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSet {
    records: Vec<CommentatorRecord>,
    positions: HashMap<UserId, usize>,
}

impl RecipientSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one post's commentators, in their first-seen order, and
    /// returns how many new recipients were added.
    pub fn merge_post(&mut self, post_id: PostId, commentators: &[(UserId, CommentId)]) -> usize {
        let before = self.records.len();
        for &(user_id, comment_id) in commentators {
            if let Entry::Vacant(slot) = self.positions.entry(user_id) {
                slot.insert(self.records.len());
                self.records.push(CommentatorRecord {
                    user_id,
                    post_id,
                    comment_id,
                });
            }
        }
        self.records.len() - before
    }

    /// Returns the anchor assigned to `user_id`.
    #[must_use]
    pub fn get(&self, user_id: UserId) -> Option<&CommentatorRecord> {
        self.positions
            .get(&user_id)
            .and_then(|&position| self.records.get(position))
    }

    /// Returns recipients in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CommentatorRecord> {
        self.records.iter()
    }

    /// Returns recipient ids in first-seen order.
    #[must_use]
    pub fn user_ids(&self) -> Vec<UserId> {
        self.records.iter().map(|record| record.user_id).collect()
    }

    /// Returns the number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecipientSet {
    type Item = &'a CommentatorRecord;
    type IntoIter = std::slice::Iter<'a, CommentatorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
