//! Contract tests for the in-memory campaign store.

use super::helpers::{persisted_task, post, store, user};
use chrono::{TimeDelta, Utc};
use commentcast::campaign::{
    adapters::memory::InMemoryCampaignStore,
    domain::{
        CampaignHistoryEntry, CampaignStats, CampaignStatus, PostStatsRecord, SendOutcome,
        TaskChanges, TaskId,
    },
    ports::{CampaignStore, CampaignStoreError},
};
use commentcast::social::domain::{CommentId, GroupId, PostDetails, UserProfile};
use eyre::{Result, eyre};
use rstest::rstest;

fn changes(status: CampaignStatus) -> TaskChanges {
    TaskChanges {
        status,
        sent: None,
        failed: None,
        total: None,
        log: None,
        error: None,
        completed_at: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_update_keeps_untouched_fields(store: InMemoryCampaignStore) -> Result<()> {
    let task = persisted_task(TimeDelta::zero(), CampaignStatus::Pending);
    store.create_or_replace_task(&task).await?;

    store
        .update_task(
            task.id(),
            &TaskChanges {
                sent: Some(4),
                total: Some(9),
                ..changes(CampaignStatus::Sending)
            },
        )
        .await?;

    let stored = store
        .find_task(task.id())
        .await?
        .ok_or_else(|| eyre!("task missing"))?;
    assert_eq!(stored.status(), CampaignStatus::Sending);
    assert_eq!(
        (stored.counters().sent, stored.counters().failed, stored.counters().total),
        (4, 0, 9)
    );
    assert_eq!(stored.message(), task.message());
    assert_eq!(stored.created_at(), task.created_at());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_an_unknown_task_is_not_found(store: InMemoryCampaignStore) {
    let task_id = TaskId::new();

    let result = store
        .update_task(&task_id, &changes(CampaignStatus::Failed))
        .await;

    assert!(matches!(result, Err(CampaignStoreError::NotFound(id)) if id == task_id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_are_listed_newest_first_with_paging(store: InMemoryCampaignStore) -> Result<()> {
    let oldest = persisted_task(TimeDelta::hours(3), CampaignStatus::Completed);
    let middle = persisted_task(TimeDelta::hours(2), CampaignStatus::Failed);
    let newest = persisted_task(TimeDelta::hours(1), CampaignStatus::Completed);
    for task in [&middle, &oldest, &newest] {
        store.create_or_replace_task(task).await?;
    }

    let first_page = store.list_tasks(2, 0).await?;
    let second_page = store.list_tasks(2, 2).await?;

    let ids: Vec<&TaskId> = first_page.iter().map(|task| task.id()).collect();
    assert_eq!(ids, vec![newest.id(), middle.id()]);
    assert_eq!(second_page, vec![oldest]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replacing_a_task_overwrites_the_row(store: InMemoryCampaignStore) -> Result<()> {
    let task = persisted_task(TimeDelta::zero(), CampaignStatus::Pending);
    store.create_or_replace_task(&task).await?;
    store.create_or_replace_task(&task).await?;

    assert_eq!(store.list_tasks(10, 0).await?.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stats_only_count_rows_of_the_task(store: InMemoryCampaignStore) -> Result<()> {
    let task_id = TaskId::new();
    let other_id = TaskId::new();
    let now = Utc::now();
    for (owner, outcome) in [
        (&task_id, SendOutcome::Sent),
        (&task_id, SendOutcome::Failed),
        (&other_id, SendOutcome::Sent),
    ] {
        let entry = CampaignHistoryEntry::new(
            owner.clone(),
            user(1),
            post(1),
            CommentId::new(1),
            outcome,
            now,
        );
        store.append_history(&entry).await?;
    }

    let stats = store.campaign_stats(&task_id).await?;

    assert_eq!(
        stats,
        CampaignStats {
            total: 2,
            sent: 1,
            failed: 1
        }
    );
    assert_eq!(store.history(&other_id)?.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn post_stats_upsert_per_day(store: InMemoryCampaignStore) -> Result<()> {
    let group_id = GroupId::new(5)?;
    let now = Utc::now();
    let details = |views| PostDetails {
        views,
        ..PostDetails::default()
    };

    store
        .upsert_post_stats(&PostStatsRecord::from_details(group_id, post(1), &details(10), now))
        .await?;
    store
        .upsert_post_stats(&PostStatsRecord::from_details(group_id, post(1), &details(15), now))
        .await?;
    store
        .upsert_post_stats(&PostStatsRecord::from_details(
            group_id,
            post(1),
            &details(3),
            now - TimeDelta::days(1),
        ))
        .await?;

    let mut views: Vec<u64> = store.post_stats()?.iter().map(|record| record.views).collect();
    views.sort_unstable();
    assert_eq!(views, vec![3, 15]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profiles_upsert_by_user(store: InMemoryCampaignStore) -> Result<()> {
    let mut profile = UserProfile {
        id: user(8),
        first_name: "Ann".to_owned(),
        last_name: "Lee".to_owned(),
        photo_url: String::new(),
        last_seen: None,
    };
    store.upsert_user_profile(&profile, Utc::now()).await?;
    profile.last_name = "Park".to_owned();
    store.upsert_user_profile(&profile, Utc::now()).await?;

    assert_eq!(store.user_profile(user(8))?, Some(profile));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_writes_leave_reads_working(store: InMemoryCampaignStore) -> Result<()> {
    let task = persisted_task(TimeDelta::zero(), CampaignStatus::Pending);
    store.create_or_replace_task(&task).await?;
    store.fail_writes(true)?;

    let result = store
        .update_task(task.id(), &changes(CampaignStatus::Collecting))
        .await;

    assert!(matches!(result, Err(CampaignStoreError::Persistence(_))));
    let stored = store
        .find_task(task.id())
        .await?
        .ok_or_else(|| eyre!("task missing"))?;
    assert_eq!(stored.status(), CampaignStatus::Pending);
    Ok(())
}
