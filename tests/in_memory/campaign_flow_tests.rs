//! End-to-end campaign runs over the in-memory adapters.

use super::helpers::{api, credentials, persisted_task, seed_post, service, store};
use chrono::TimeDelta;
use commentcast::campaign::{
    adapters::memory::InMemoryCampaignStore,
    domain::{CampaignStatus, CampaignTask},
    ports::CampaignStore,
    services::SubmitCampaignRequest,
};
use commentcast::social::adapters::memory::InMemorySocialApi;
use eyre::{Result, eyre};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_campaigns_keep_independent_counters(
    api: InMemorySocialApi,
    store: InMemoryCampaignStore,
) -> Result<()> {
    seed_post(&api, 1, &[1, 2, 3]);
    seed_post(&api, 2, &[4, 5]);
    let service = service(&api, &store);

    let first = service
        .submit(SubmitCampaignRequest::new([1]).with_credentials(Some(credentials())))
        .await?;
    let second = service
        .submit(SubmitCampaignRequest::new([2]).with_credentials(Some(credentials())))
        .await?;
    service.wait(first.id()).await?;
    service.wait(second.id()).await?;

    let totals: Vec<(CampaignStatus, u64)> = [first.id(), second.id()]
        .into_iter()
        .map(|task_id| {
            service
                .registry()
                .snapshot(task_id)?
                .map(|task| (task.status(), task.counters().sent))
                .ok_or_else(|| eyre!("task {task_id} missing"))
        })
        .collect::<Result<_>>()?;
    assert_eq!(
        totals,
        vec![(CampaignStatus::Completed, 3), (CampaignStatus::Completed, 2)]
    );
    assert_eq!(api.replies()?.len(), 5);
    assert_eq!(api.handle_counts()?, (2, 2));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_mixes_earlier_rows_with_live_tasks(
    api: InMemorySocialApi,
    store: InMemoryCampaignStore,
) -> Result<()> {
    let earlier = persisted_task(TimeDelta::days(1), CampaignStatus::Completed);
    store.create_or_replace_task(&earlier).await?;
    seed_post(&api, 7, &[1]);
    let service = service(&api, &store);
    let live = service
        .submit(SubmitCampaignRequest::new([7]).with_credentials(Some(credentials())))
        .await?;
    service.wait(live.id()).await?;

    let listed: Vec<CampaignTask> = service.list_task_snapshots(10, 0).await?;

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), live.id());
    assert_eq!(listed[0].status(), CampaignStatus::Completed);
    assert_eq!(listed[1], earlier);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_has_no_snapshot(
    api: InMemorySocialApi,
    store: InMemoryCampaignStore,
) -> Result<()> {
    let service = service(&api, &store);
    let missing = persisted_task(TimeDelta::zero(), CampaignStatus::Pending);

    assert_eq!(service.task_snapshot(missing.id()).await?, None);
    Ok(())
}
