//! Given steps for campaign delivery BDD scenarios.

use super::world::{CampaignWorld, comment_id};
use commentcast::social::{
    domain::{Comment, PostId},
    ports::SocialApiError,
};
use rstest_bdd_macros::given;

#[given("user {user:u64} commented on post {post:u64}")]
fn user_commented(world: &mut CampaignWorld, user: u64, post: u64) -> Result<(), eyre::Report> {
    let post_id = PostId::new(i64::try_from(post)?)?;
    let author = i64::try_from(user)?;
    world
        .api
        .add_comments(post_id, [Comment::new(comment_id(post, user), author)])?;
    Ok(())
}

#[given("replies to user {user:u64} on post {post:u64} are rejected")]
fn replies_rejected(world: &mut CampaignWorld, user: u64, post: u64) -> Result<(), eyre::Report> {
    world.api.reject_replies_to(comment_id(post, user))?;
    Ok(())
}

#[given("the community API is unreachable")]
fn api_unreachable(world: &mut CampaignWorld) -> Result<(), eyre::Report> {
    world
        .api
        .fail_connect(SocialApiError::transient("connection refused"))?;
    Ok(())
}
