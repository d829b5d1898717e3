//! Campaign store behaviour against a real database.

use super::helpers::test_schema;
use chrono::{TimeDelta, Utc};
use commentcast::campaign::{
    domain::{
        CampaignHistoryEntry, CampaignStats, CampaignStatus, CampaignTask, PostStatsRecord,
        ProgressEvent, SendOutcome, TaskId,
    },
    ports::{CampaignStore, CampaignStoreError},
};
use commentcast::social::domain::{CommentId, GroupId, GroupInfo, PostDetails, PostId, UserId};
use eyre::{Result, eyre};
use mockable::DefaultClock;
use rstest::rstest;

fn task(posts: &[i64]) -> Result<CampaignTask> {
    let post_ids = posts
        .iter()
        .map(|&id| PostId::new(id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CampaignTask::new(post_ids, "Thanks!", &DefaultClock)?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_rows_follow_the_lifecycle() -> Result<()> {
    let Some(schema) = test_schema()? else {
        return Ok(());
    };
    let store = schema.store()?;
    let mut task = task(&[10, 20])?;
    store.create_or_replace_task(&task).await?;

    let changes = task.start_collecting()?;
    store.update_task(task.id(), &changes).await?;
    let applied = task.apply_event(&ProgressEvent::SendingStarted { total: 4 }, &DefaultClock)?;
    store.update_task(task.id(), &applied.changes).await?;

    let stored = store
        .find_task(task.id())
        .await?
        .ok_or_else(|| eyre!("task row missing"))?;
    assert_eq!(stored.status(), CampaignStatus::Sending);
    assert_eq!(stored.counters().total, 4);
    assert_eq!(stored.post_ids(), task.post_ids());
    assert_eq!(stored.log().lines(), task.log().lines());
    assert_eq!(stored.message(), "Thanks!");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_rows_are_reported() -> Result<()> {
    let Some(schema) = test_schema()? else {
        return Ok(());
    };
    let store = schema.store()?;
    let mut task = task(&[1])?;
    let changes = task.start_collecting()?;

    let result = store.update_task(task.id(), &changes).await;

    assert!(matches!(result, Err(CampaignStoreError::NotFound(_))));
    assert_eq!(store.find_task(&TaskId::new()).await?, None);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_is_newest_first() -> Result<()> {
    let Some(schema) = test_schema()? else {
        return Ok(());
    };
    let store = schema.store()?;
    let first = task(&[1])?;
    store.create_or_replace_task(&first).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = task(&[2])?;
    store.create_or_replace_task(&second).await?;

    let listed = store.list_tasks(10, 0).await?;
    let skipped = store.list_tasks(10, 1).await?;

    let ids: Vec<&TaskId> = listed.iter().map(CampaignTask::id).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);
    assert_eq!(skipped.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn history_feeds_campaign_stats() -> Result<()> {
    let Some(schema) = test_schema()? else {
        return Ok(());
    };
    let store = schema.store()?;
    let task = task(&[10])?;
    store.create_or_replace_task(&task).await?;
    let now = Utc::now();
    for (user, outcome) in [(1, SendOutcome::Sent), (2, SendOutcome::Failed), (3, SendOutcome::Sent)] {
        let entry = CampaignHistoryEntry::new(
            task.id().clone(),
            UserId::new(user)?,
            PostId::new(10)?,
            CommentId::new(100),
            outcome,
            now,
        );
        store.append_history(&entry).await?;
    }

    let stats = store.campaign_stats(task.id()).await?;

    assert_eq!(
        stats,
        CampaignStats {
            total: 3,
            sent: 2,
            failed: 1
        }
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn post_stats_and_group_cache_upsert() -> Result<()> {
    let Some(schema) = test_schema()? else {
        return Ok(());
    };
    let store = schema.store()?;
    let group_id = GroupId::new(5)?;
    let now = Utc::now();
    for views in [10, 25] {
        let details = PostDetails {
            views,
            ..PostDetails::default()
        };
        store
            .upsert_post_stats(&PostStatsRecord::from_details(
                group_id,
                PostId::new(3)?,
                &details,
                now,
            ))
            .await?;
    }
    let mut info = GroupInfo {
        id: group_id,
        name: "Club".to_owned(),
        screen_name: "club5".to_owned(),
        description: String::new(),
        members_count: 10,
        photo_url: String::new(),
    };
    store
        .upsert_group_info(&info, now - TimeDelta::hours(2))
        .await?;
    info.members_count = 11;
    store.upsert_group_info(&info, now).await?;

    let cached = store
        .find_group_info(group_id)
        .await?
        .ok_or_else(|| eyre!("group cache missing"))?;
    assert_eq!(cached.info, info);
    assert!(cached.is_fresh(Utc::now(), TimeDelta::hours(1)));
    Ok(())
}
