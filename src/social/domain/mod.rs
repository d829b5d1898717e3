//! Domain model for the social network context.
//!
//! Identifiers are validated newtypes so that a post id can never be passed
//! where a comment id is expected, and community-authored comments (negative
//! author ids) are filtered out at the type boundary.

mod credentials;
mod error;
mod ids;
mod records;

pub use credentials::CommunityCredentials;
pub use error::SocialDomainError;
pub use ids::{CommentId, GroupId, PostId, UserId};
pub use records::{Comment, GroupInfo, PostDetails, UserProfile, text_preview};
