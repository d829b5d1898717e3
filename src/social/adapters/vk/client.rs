//! HTTP client for the VK API.

use super::wire::{Envelope, GroupsById, ItemsPage, PostsById, WireComment, WirePost, WireUser};
use crate::social::{
    domain::{
        Comment, CommentId, CommunityCredentials, GroupId, GroupInfo, PostDetails, PostId, UserId,
        UserProfile,
    },
    ports::{SocialApi, SocialApiError, SocialApiFactory, SocialApiResult},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Base URL of the VK method endpoint.
const API_BASE_URL: &str = "https://api.vk.com/method";

/// API version sent with every call.
const API_VERSION: &str = "5.199";

/// Largest page `wall.get` accepts.
const MAX_POSTS_PAGE: u64 = 100;

/// Builds [`VkApiClient`] handles that share one connection pool.
#[derive(Debug, Clone)]
pub struct VkApiFactory {
    http: reqwest::Client,
    base_url: String,
}

impl VkApiFactory {
    /// Creates a factory with a 30 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SocialApiError::Permanent`] when the HTTP client cannot be
    /// built.
    pub fn new() -> SocialApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                SocialApiError::permanent(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            http,
            base_url: API_BASE_URL.to_owned(),
        })
    }

    /// Overrides the method endpoint, e.g. for a local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

impl SocialApiFactory for VkApiFactory {
    type Api = VkApiClient;

    fn connect(&self, credentials: &CommunityCredentials) -> SocialApiResult<Self::Api> {
        Ok(VkApiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            group_id: credentials.group_id(),
            user_token: credentials.user_token().to_owned(),
            group_token: credentials.group_token().to_owned(),
            closed: AtomicBool::new(false),
        })
    }
}

/// VK API client bound to one community.
#[derive(Debug)]
pub struct VkApiClient {
    http: reqwest::Client,
    base_url: String,
    group_id: GroupId,
    user_token: String,
    group_token: String,
    closed: AtomicBool,
}

/// Which of the community's tokens a call is made with.
#[derive(Debug, Clone, Copy)]
enum TokenKind {
    User,
    Group,
}

impl VkApiClient {
    fn token(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::User => &self.user_token,
            TokenKind::Group => &self.group_token,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: TokenKind,
        params: &[(&str, String)],
    ) -> SocialApiResult<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SocialApiError::permanent("API client is closed"));
        }

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token(token).to_owned()));
        form.push(("v", API_VERSION.to_owned()));

        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|err| SocialApiError::transient(format!("{method} request failed: {err}")))?;

        let status = response.status();
        debug!(method, status = %status, "VK API response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{method} returned {status}: {body}");
            return Err(if is_transient_status(status) {
                SocialApiError::Transient(message)
            } else {
                SocialApiError::Permanent(message)
            });
        }

        let envelope: Envelope<T> = response.json().await.map_err(|err| {
            SocialApiError::permanent(format!("{method} returned a malformed body: {err}"))
        })?;
        if let Some(error) = envelope.error {
            return Err(error.into_error(method));
        }
        envelope
            .response
            .ok_or_else(|| SocialApiError::permanent(format!("{method} returned no response")))
    }

    async fn comments_page(
        &self,
        post_id: PostId,
        params: Vec<(&str, String)>,
    ) -> SocialApiResult<Vec<Comment>> {
        let mut form = vec![
            ("owner_id", self.group_id.owner_id().to_string()),
            ("post_id", post_id.to_string()),
            ("extended", "0".to_owned()),
        ];
        form.extend(params);
        let page: ItemsPage<WireComment> = self
            .call("wall.getComments", TokenKind::User, &form)
            .await?;
        Ok(page
            .items
            .into_iter()
            .map(|item| Comment::new(CommentId::new(item.id), item.from_id))
            .collect())
    }
}

#[async_trait]
impl SocialApi for VkApiClient {
    async fn list_comments(
        &self,
        post_id: PostId,
        offset: u64,
        count: u64,
    ) -> SocialApiResult<Vec<Comment>> {
        self.comments_page(
            post_id,
            vec![("offset", offset.to_string()), ("count", count.to_string())],
        )
        .await
    }

    async fn recent_comments(&self, post_id: PostId, count: u64) -> SocialApiResult<Vec<Comment>> {
        self.comments_page(
            post_id,
            vec![("count", count.to_string()), ("sort", "desc".to_owned())],
        )
        .await
    }

    async fn send_reply(&self, post_id: PostId, parent: CommentId, text: &str) -> bool {
        let form = [
            ("owner_id", self.group_id.owner_id().to_string()),
            ("post_id", post_id.to_string()),
            ("reply_to_comment", parent.to_string()),
            ("message", text.to_owned()),
        ];
        match self
            .call::<serde_json::Value>("wall.createComment", TokenKind::Group, &form)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                debug!(post_id = %post_id, comment_id = %parent, error = %err, "reply rejected");
                false
            }
        }
    }

    async fn get_users(&self, user_ids: &[UserId]) -> SocialApiResult<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = user_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let form = [
            ("user_ids", joined),
            ("fields", "photo_100,last_seen".to_owned()),
        ];
        let users: Vec<WireUser> = self.call("users.get", TokenKind::User, &form).await?;
        Ok(users.into_iter().filter_map(WireUser::into_profile).collect())
    }

    async fn get_post(&self, post_id: PostId) -> SocialApiResult<Option<PostDetails>> {
        let form = [
            (
                "posts",
                format!("{}_{post_id}", self.group_id.owner_id()),
            ),
            ("extended", "1".to_owned()),
        ];
        let posts: PostsById = self.call("wall.getById", TokenKind::User, &form).await?;
        Ok(posts.into_first().map(PostDetails::from))
    }

    async fn get_group(&self) -> SocialApiResult<Option<GroupInfo>> {
        let form = [
            ("group_id", self.group_id.to_string()),
            ("fields", "members_count,description,photo_200".to_owned()),
        ];
        let groups: GroupsById = self.call("groups.getById", TokenKind::User, &form).await?;
        Ok(groups.into_first().and_then(|group| group.into_info()))
    }

    async fn list_posts(&self, limit: u64) -> SocialApiResult<Vec<PostDetails>> {
        let form = [
            ("owner_id", self.group_id.owner_id().to_string()),
            ("count", limit.clamp(1, MAX_POSTS_PAGE).to_string()),
            ("extended", "1".to_owned()),
        ];
        let page: ItemsPage<WirePost> = self.call("wall.get", TokenKind::User, &form).await?;
        Ok(page.items.into_iter().map(PostDetails::from).collect())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!(group_id = %self.group_id, "VK API client closed twice");
        }
    }
}

const fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
