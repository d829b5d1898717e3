//! Wire formats of VK API responses.

use crate::social::{
    domain::{GroupId, GroupInfo, PostDetails, PostId, UserId, UserProfile},
    ports::SocialApiError,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Error codes that signal throttling or a temporary server fault.
const TRANSIENT_ERROR_CODES: [i64; 5] = [1, 6, 9, 10, 29];

/// Top-level envelope: exactly one of `response` and `error` is present.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

impl ApiErrorBody {
    pub fn into_error(self, method: &str) -> SocialApiError {
        let message = format!("{method} failed with code {}: {}", self.error_code, self.error_msg);
        if TRANSIENT_ERROR_CODES.contains(&self.error_code) {
            SocialApiError::Transient(message)
        } else {
            SocialApiError::Permanent(message)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemsPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireComment {
    pub id: u64,
    #[serde(default)]
    pub from_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Counter {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireAttachment {
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WirePost {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub comments: Counter,
    #[serde(default)]
    pub likes: Counter,
    #[serde(default)]
    pub reposts: Counter,
    #[serde(default)]
    pub views: Counter,
    #[serde(default)]
    pub attachments: Vec<WireAttachment>,
}

impl From<WirePost> for PostDetails {
    fn from(post: WirePost) -> Self {
        let has_kind = |kind: &str| post.attachments.iter().any(|item| item.kind == kind);
        let has_photo = has_kind("photo");
        let has_video = has_kind("video");
        Self {
            id: PostId::new(post.id).ok(),
            published_at: timestamp(post.date),
            views: post.views.count,
            likes: post.likes.count,
            comments: post.comments.count,
            reposts: post.reposts.count,
            attachments_count: u64::try_from(post.attachments.len()).unwrap_or(u64::MAX),
            has_photo,
            has_video,
            text: post.text,
        }
    }
}

/// `wall.getById` answers either with an items page or with a bare list
/// depending on the API version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum PostsById {
    Page(ItemsPage<WirePost>),
    List(Vec<WirePost>),
}

impl PostsById {
    pub fn into_first(self) -> Option<WirePost> {
        match self {
            Self::Page(page) => page.items.into_iter().next(),
            Self::List(items) => items.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireLastSeen {
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub photo_100: String,
    pub last_seen: Option<WireLastSeen>,
}

impl WireUser {
    pub fn into_profile(self) -> Option<UserProfile> {
        Some(UserProfile {
            id: UserId::new(self.id).ok()?,
            first_name: self.first_name,
            last_name: self.last_name,
            photo_url: self.photo_100,
            last_seen: self.last_seen.and_then(|seen| timestamp(seen.time)),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireGroup {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members_count: u64,
    #[serde(default)]
    pub photo_200: String,
}

impl WireGroup {
    pub fn into_info(self) -> Option<GroupInfo> {
        Some(GroupInfo {
            id: GroupId::new(self.id).ok()?,
            name: self.name,
            screen_name: self.screen_name,
            description: self.description,
            members_count: self.members_count,
            photo_url: self.photo_200,
        })
    }
}

/// `groups.getById` moved its list under a `groups` key in newer versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum GroupsById {
    Wrapped { groups: Vec<WireGroup> },
    List(Vec<WireGroup>),
}

impl GroupsById {
    pub fn into_first(self) -> Option<WireGroup> {
        match self {
            Self::Wrapped { groups } => groups.into_iter().next(),
            Self::List(groups) => groups.into_iter().next(),
        }
    }
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}
