//! Scripted in-memory social API for tests and dry runs.

use crate::social::{
    domain::{
        Comment, CommentId, CommunityCredentials, GroupInfo, PostDetails, PostId, UserId,
        UserProfile,
    },
    ports::{SocialApi, SocialApiError, SocialApiFactory, SocialApiResult},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reply recorded by [`InMemorySocialApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    /// Post the reply was posted under.
    pub post_id: PostId,
    /// Comment the reply is threaded under.
    pub parent: CommentId,
    /// Reply text.
    pub text: String,
    /// Whether the API accepted the reply.
    pub delivered: bool,
}

/// Thread-safe scripted social API.
///
/// Clones share state, so the instance kept by a test observes every call
/// made through handles produced by [`SocialApiFactory::connect`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySocialApi {
    state: Arc<RwLock<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    comments: HashMap<PostId, Vec<Comment>>,
    listing_failures: HashMap<PostId, u64>,
    rejected_parents: HashSet<CommentId>,
    posts: HashMap<PostId, PostDetails>,
    users: HashMap<UserId, UserProfile>,
    group: Option<GroupInfo>,
    fail_users: bool,
    fail_posts: bool,
    fail_group: bool,
    connect_error: Option<SocialApiError>,
    replies: Vec<SentReply>,
    user_batches: Vec<usize>,
    comment_pages: Vec<(PostId, u64)>,
    connections: usize,
    closes: usize,
}

impl InMemorySocialApi {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> SocialApiResult<RwLockReadGuard<'_, ScriptState>> {
        self.state
            .read()
            .map_err(|err| SocialApiError::permanent(err.to_string()))
    }

    fn write(&self) -> SocialApiResult<RwLockWriteGuard<'_, ScriptState>> {
        self.state
            .write()
            .map_err(|err| SocialApiError::permanent(err.to_string()))
    }

    /// Appends comments to a post thread.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn add_comments(
        &self,
        post_id: PostId,
        comments: impl IntoIterator<Item = Comment>,
    ) -> SocialApiResult<()> {
        self.write()?
            .comments
            .entry(post_id)
            .or_default()
            .extend(comments);
        Ok(())
    }

    /// Makes listing of `post_id` fail for pages starting at or after
    /// `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_listing_from(&self, post_id: PostId, offset: u64) -> SocialApiResult<()> {
        self.write()?.listing_failures.insert(post_id, offset);
        Ok(())
    }

    /// Makes replies threaded under `parent` fail.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn reject_replies_to(&self, parent: CommentId) -> SocialApiResult<()> {
        self.write()?.rejected_parents.insert(parent);
        Ok(())
    }

    /// Registers post details returned by [`SocialApi::get_post`].
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn set_post(&self, post_id: PostId, details: PostDetails) -> SocialApiResult<()> {
        self.write()?.posts.insert(post_id, details);
        Ok(())
    }

    /// Registers a profile returned by [`SocialApi::get_users`].
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn set_user(&self, profile: UserProfile) -> SocialApiResult<()> {
        self.write()?.users.insert(profile.id, profile);
        Ok(())
    }

    /// Registers the community returned by [`SocialApi::get_group`].
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn set_group(&self, group: GroupInfo) -> SocialApiResult<()> {
        self.write()?.group = Some(group);
        Ok(())
    }

    /// Makes profile, post and group lookups fail with transient errors.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_lookups(&self, users: bool, posts: bool, group: bool) -> SocialApiResult<()> {
        let mut state = self.write()?;
        state.fail_users = users;
        state.fail_posts = posts;
        state.fail_group = group;
        Ok(())
    }

    /// Makes [`SocialApiFactory::connect`] fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_connect(&self, error: SocialApiError) -> SocialApiResult<()> {
        self.write()?.connect_error = Some(error);
        Ok(())
    }

    /// Returns every reply attempted so far, including rejected ones.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn replies(&self) -> SocialApiResult<Vec<SentReply>> {
        Ok(self.read()?.replies.clone())
    }

    /// Returns the replies the API accepted.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn delivered_replies(&self) -> SocialApiResult<Vec<SentReply>> {
        Ok(self
            .read()?
            .replies
            .iter()
            .filter(|reply| reply.delivered)
            .cloned()
            .collect())
    }

    /// Returns the size of every profile batch requested so far.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn user_batches(&self) -> SocialApiResult<Vec<usize>> {
        Ok(self.read()?.user_batches.clone())
    }

    /// Returns every `(post, offset)` page requested so far.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn comment_pages(&self) -> SocialApiResult<Vec<(PostId, u64)>> {
        Ok(self.read()?.comment_pages.clone())
    }

    /// Returns `(connections opened, handles closed)`.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn handle_counts(&self) -> SocialApiResult<(usize, usize)> {
        let state = self.read()?;
        Ok((state.connections, state.closes))
    }
}

#[async_trait]
impl SocialApi for InMemorySocialApi {
    async fn list_comments(
        &self,
        post_id: PostId,
        offset: u64,
        count: u64,
    ) -> SocialApiResult<Vec<Comment>> {
        let mut state = self.write()?;
        state.comment_pages.push((post_id, offset));
        if state
            .listing_failures
            .get(&post_id)
            .is_some_and(|failing_offset| offset >= *failing_offset)
        {
            return Err(SocialApiError::transient(format!(
                "comment listing for post {post_id} timed out"
            )));
        }
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(count).unwrap_or(usize::MAX);
        Ok(state
            .comments
            .get(&post_id)
            .map(|thread| thread.iter().skip(skip).take(take).copied().collect())
            .unwrap_or_default())
    }

    async fn recent_comments(&self, post_id: PostId, count: u64) -> SocialApiResult<Vec<Comment>> {
        let state = self.read()?;
        let take = usize::try_from(count).unwrap_or(usize::MAX);
        Ok(state
            .comments
            .get(&post_id)
            .map(|thread| thread.iter().rev().take(take).copied().collect())
            .unwrap_or_default())
    }

    async fn send_reply(&self, post_id: PostId, parent: CommentId, text: &str) -> bool {
        let Ok(mut state) = self.write() else {
            return false;
        };
        let delivered = !state.rejected_parents.contains(&parent);
        state.replies.push(SentReply {
            post_id,
            parent,
            text: text.to_owned(),
            delivered,
        });
        delivered
    }

    async fn get_users(&self, user_ids: &[UserId]) -> SocialApiResult<Vec<UserProfile>> {
        let mut state = self.write()?;
        state.user_batches.push(user_ids.len());
        if state.fail_users {
            return Err(SocialApiError::transient("users lookup rate limited"));
        }
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn get_post(&self, post_id: PostId) -> SocialApiResult<Option<PostDetails>> {
        let state = self.read()?;
        if state.fail_posts {
            return Err(SocialApiError::transient("post lookup rate limited"));
        }
        Ok(state.posts.get(&post_id).cloned())
    }

    async fn get_group(&self) -> SocialApiResult<Option<GroupInfo>> {
        let state = self.read()?;
        if state.fail_group {
            return Err(SocialApiError::transient("group lookup rate limited"));
        }
        Ok(state.group.clone())
    }

    async fn list_posts(&self, limit: u64) -> SocialApiResult<Vec<PostDetails>> {
        let state = self.read()?;
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut posts: Vec<PostDetails> = state.posts.values().cloned().collect();
        posts.sort_by(|left, right| right.id.cmp(&left.id));
        posts.truncate(take);
        Ok(posts)
    }

    async fn close(&self) {
        if let Ok(mut state) = self.write() {
            state.closes += 1;
        }
    }
}

impl SocialApiFactory for InMemorySocialApi {
    type Api = Self;

    fn connect(&self, _credentials: &CommunityCredentials) -> SocialApiResult<Self::Api> {
        let mut state = self.write()?;
        if let Some(error) = state.connect_error.clone() {
            return Err(error);
        }
        state.connections += 1;
        drop(state);
        Ok(self.clone())
    }
}
