//! When steps for campaign delivery BDD scenarios.

use super::world::{CampaignWorld, credentials, run_async};
use commentcast::campaign::services::SubmitCampaignRequest;
use eyre::WrapErr;
use rstest_bdd_macros::when;

fn submit(world: &mut CampaignWorld, posts: Vec<i64>) -> Result<(), eyre::Report> {
    let request = SubmitCampaignRequest::new(posts).with_credentials(Some(credentials()?));
    world.last_submission = Some(run_async(world.service.submit(request)));
    Ok(())
}

#[when("a campaign for post {post:i64} is submitted")]
fn submit_one_post(world: &mut CampaignWorld, post: i64) -> Result<(), eyre::Report> {
    submit(world, vec![post])
}

#[when("a campaign for posts {first:i64} and {second:i64} is submitted")]
fn submit_two_posts(
    world: &mut CampaignWorld,
    first: i64,
    second: i64,
) -> Result<(), eyre::Report> {
    submit(world, vec![first, second])
}

#[when("a campaign without posts is submitted")]
fn submit_without_posts(world: &mut CampaignWorld) -> Result<(), eyre::Report> {
    submit(world, Vec::new())
}

#[when("the campaign finishes")]
fn campaign_finishes(world: &mut CampaignWorld) -> Result<(), eyre::Report> {
    let task_id = world.submitted_task()?.id().clone();
    run_async(world.service.wait(&task_id)).wrap_err("wait for campaign job")?;
    let task = run_async(world.service.task_snapshot(&task_id))
        .wrap_err("read campaign snapshot")?
        .ok_or_else(|| eyre::eyre!("campaign {task_id} vanished"))?;
    world.last_task = Some(task);
    Ok(())
}
