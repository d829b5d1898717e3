//! Then steps for campaign delivery BDD scenarios.

use super::world::{CampaignWorld, comment_id, run_async};
use commentcast::campaign::{
    domain::{CampaignDomainError, CampaignStatus, CampaignTask},
    ports::CampaignStore,
    services::CampaignServiceError,
};
use rstest_bdd_macros::then;

fn finished_task(world: &CampaignWorld) -> Result<&CampaignTask, eyre::Report> {
    world
        .last_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("campaign has not finished in scenario world"))
}

#[then(r#"the campaign status is "{status}""#)]
fn campaign_status_is(world: &CampaignWorld, status: String) -> Result<(), eyre::Report> {
    let expected = CampaignStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = finished_task(world)?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("the counters show {sent:u64} sent and {failed:u64} failed")]
fn counters_show(world: &CampaignWorld, sent: u64, failed: u64) -> Result<(), eyre::Report> {
    let counters = finished_task(world)?.counters();
    if (counters.sent, counters.failed) != (sent, failed) {
        return Err(eyre::eyre!(
            "expected {sent} sent and {failed} failed, found {counters:?}"
        ));
    }
    let delivered = world.api.delivered_replies()?.len();
    if u64::try_from(delivered)? != sent {
        return Err(eyre::eyre!("expected {sent} delivered replies, found {delivered}"));
    }
    Ok(())
}

#[then("user {user:u64} was answered under post {post:u64}")]
fn user_answered_under(world: &CampaignWorld, user: u64, post: u64) -> Result<(), eyre::Report> {
    let parent = comment_id(post, user);
    let replies = world.api.replies()?;
    let matching = replies
        .iter()
        .filter(|reply| reply.parent == parent && reply.post_id.value() == post)
        .count();
    if matching != 1 {
        return Err(eyre::eyre!(
            "expected one reply to comment {parent}, found {matching}"
        ));
    }
    Ok(())
}

#[then(r#"every reply reads "{text}""#)]
fn every_reply_reads(world: &CampaignWorld, text: String) -> Result<(), eyre::Report> {
    let replies = world.api.replies()?;
    if let Some(reply) = replies.iter().find(|reply| reply.text != text) {
        return Err(eyre::eyre!("unexpected reply text {:?}", reply.text));
    }
    Ok(())
}

#[then(r#"the campaign log mentions "{needle}""#)]
fn log_mentions(world: &CampaignWorld, needle: String) -> Result<(), eyre::Report> {
    let task = finished_task(world)?;
    if !task.log().contains(&needle) {
        return Err(eyre::eyre!(
            "log does not mention {needle:?}: {:?}",
            task.log().lines()
        ));
    }
    Ok(())
}

#[then("the submission is rejected for having no posts")]
fn rejected_for_no_posts(world: &CampaignWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_submission
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submission result"))?;

    if !matches!(
        result,
        Err(CampaignServiceError::Domain(
            CampaignDomainError::EmptyTargetPosts
        ))
    ) {
        return Err(eyre::eyre!(
            "expected EmptyTargetPosts error, got {result:?}"
        ));
    }
    Ok(())
}

#[then("no campaign was stored")]
fn no_campaign_stored(world: &CampaignWorld) -> Result<(), eyre::Report> {
    let stored = run_async(world.store.list_tasks(10, 0))?;
    if !stored.is_empty() {
        return Err(eyre::eyre!("expected no stored tasks, found {}", stored.len()));
    }
    Ok(())
}
