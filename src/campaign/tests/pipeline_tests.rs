//! Collector and sender tests against the scripted social API.

use super::fixtures::{comment, credentials, post, seed_two_posts, user};
use crate::campaign::{
    adapters::memory::{InMemoryCampaignStore, RecordingProgressSink},
    domain::{ProgressEvent, RecipientSet, SendCounters},
    ports::{ProgressSink, ProgressSinkError, ProgressSinkResult},
    services::{COMMENT_PAGE_SIZE, CommentCollector, ReplySender, collect_recipients},
};
use crate::social::{
    adapters::memory::InMemorySocialApi,
    domain::{CommentId, UserProfile},
    ports::{SocialApi, SocialApiFactory},
};
use async_trait::async_trait;
use eyre::Result;
use mockable::DefaultClock;
use mockall::{Sequence, mock};
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;

mock! {
    Sink {}

    #[async_trait]
    impl ProgressSink for Sink {
        async fn emit(&self, event: ProgressEvent) -> ProgressSinkResult<()>;
    }
}

type Sender = ReplySender<InMemorySocialApi, InMemoryCampaignStore, DefaultClock>;

#[fixture]
fn api() -> InMemorySocialApi {
    InMemorySocialApi::new()
}

fn collector(api: &InMemorySocialApi) -> CommentCollector<InMemorySocialApi> {
    CommentCollector::new(Arc::new(api.clone()), Duration::ZERO)
}

fn sender(api: &InMemorySocialApi, store: &InMemoryCampaignStore) -> Sender {
    ReplySender::new(
        Arc::new(api.clone()),
        Arc::new(store.clone()),
        Arc::new(DefaultClock),
        Duration::ZERO,
    )
}

fn profile(id: i64) -> UserProfile {
    UserProfile {
        id: user(id),
        first_name: format!("User{id}"),
        last_name: "Tester".to_owned(),
        photo_url: String::new(),
        last_seen: None,
    }
}

fn anchors(recipients: &RecipientSet) -> Vec<(u64, u64, u64)> {
    recipients
        .iter()
        .map(|record| {
            (
                record.user_id.value(),
                record.post_id.value(),
                record.comment_id.value(),
            )
        })
        .collect()
}

// ============================================================================
// Collector
// ============================================================================

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn collector_keeps_first_comment_per_person(api: InMemorySocialApi) -> Result<()> {
    api.add_comments(
        post(1),
        [
            comment(10, 7),
            comment(11, -5),
            comment(12, 8),
            comment(13, 7),
            comment(14, 0),
        ],
    )?;
    let sink = RecordingProgressSink::new();

    let commentators = collector(&api).collect(post(1), &sink).await?;

    assert_eq!(
        commentators,
        vec![(user(7), CommentId::new(10)), (user(8), CommentId::new(12))]
    );
    assert_eq!(
        sink.events(),
        vec![ProgressEvent::CollectingPage {
            post_id: post(1),
            loaded: 5,
            unique: 2,
        }]
    );
    Ok(())
}

#[rstest]
#[case(250, vec![0, 100, 200], 3)]
#[case(200, vec![0, 100, 200], 2)]
#[case(0, vec![0], 0)]
#[tokio::test(flavor = "multi_thread")]
async fn collector_pages_until_a_short_page(
    api: InMemorySocialApi,
    #[case] comments: u64,
    #[case] offsets: Vec<u64>,
    #[case] page_events: usize,
) -> Result<()> {
    api.add_comments(
        post(3),
        (1..=comments).map(|id| comment(id, i64::try_from(id % 40 + 1).unwrap_or(1))),
    )?;
    let sink = RecordingProgressSink::new();

    let commentators = collector(&api).collect(post(3), &sink).await?;

    let requested: Vec<u64> = api.comment_pages()?.into_iter().map(|(_, offset)| offset).collect();
    assert_eq!(requested, offsets);
    assert_eq!(sink.events().len(), page_events);
    assert_eq!(commentators.len(), if comments == 0 { 0 } else { 40 });
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_failure_keeps_what_was_read(api: InMemorySocialApi) -> Result<()> {
    let authors = [1_i64, 2, 3];
    api.add_comments(
        post(10),
        (0..COMMENT_PAGE_SIZE)
            .zip(authors.iter().cycle())
            .map(|(offset, author)| comment(1000 + offset, *author)),
    )?;
    api.add_comments(post(10), [comment(2000, 9)])?;
    api.fail_listing_from(post(10), COMMENT_PAGE_SIZE)?;
    let sink = RecordingProgressSink::new();

    let commentators = collector(&api).collect(post(10), &sink).await?;

    assert_eq!(
        commentators,
        vec![
            (user(1), CommentId::new(1000)),
            (user(2), CommentId::new(1001)),
            (user(3), CommentId::new(1002)),
        ]
    );
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Error { message }) if message.starts_with("Failed to read comments of post 10")
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recipients_merge_posts_in_order(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    let sink = RecordingProgressSink::new();

    let recipients = collect_recipients(&collector(&api), &[post(10), post(20)], &sink).await?;

    assert_eq!(anchors(&recipients), vec![(1, 10, 100), (2, 10, 101), (3, 20, 201)]);
    let collected: Vec<(u64, u64)> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ProgressEvent::PostCollected {
                unique,
                unique_total,
                ..
            } => Some((unique, unique_total)),
            _ => None,
        })
        .collect();
    assert_eq!(collected, vec![(2, 2), (2, 3)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn collecting_twice_yields_the_same_mapping(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    let collector = collector(&api);
    let posts = [post(20), post(10)];

    let first = collect_recipients(&collector, &posts, &RecordingProgressSink::new()).await?;
    let second = collect_recipients(&collector, &posts, &RecordingProgressSink::new()).await?;

    assert_eq!(first, second);
    assert_eq!(anchors(&first), vec![(2, 20, 200), (3, 20, 201), (1, 10, 100)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sink_rejection_stops_collection(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    let mut sink = MockSink::new();
    let mut sequence = Sequence::new();
    sink.expect_emit()
        .withf(|event| matches!(event, ProgressEvent::CollectingPage { .. }))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    sink.expect_emit()
        .withf(|event| matches!(event, ProgressEvent::PostCollected { .. }))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(ProgressSinkError::Unavailable("closed".to_owned())));

    let result = collect_recipients(&collector(&api), &[post(10), post(20)], &sink).await;

    assert!(matches!(result, Err(ProgressSinkError::Unavailable(_))));
    assert_eq!(api.comment_pages()?, vec![(post(10), 0)]);
    Ok(())
}

// ============================================================================
// Sender
// ============================================================================

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_reply_only_counts_as_failed(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    api.reject_replies_to(CommentId::new(101))?;
    let store = InMemoryCampaignStore::new();
    let sink = RecordingProgressSink::new();
    let recipients =
        collect_recipients(&collector(&api), &[post(10), post(20)], &RecordingProgressSink::new())
            .await?;

    let counters = sender(&api, &store).send(&recipients, "Hello", &sink).await?;

    assert_eq!(
        counters,
        SendCounters {
            sent: 2,
            failed: 1,
            total: 3
        }
    );
    let events = sink.events();
    assert_eq!(events.first(), Some(&ProgressEvent::SendingStarted { total: 3 }));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::CampaignCompleted { counters })
    );
    let indexes: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::SendAttempt { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    let parents: Vec<u64> = api.replies()?.iter().map(|reply| reply.parent.value()).collect();
    assert_eq!(parents, vec![100, 101, 201]);
    assert!(api.replies()?.iter().all(|reply| reply.text == "Hello"));
    let delivered: Vec<u64> = api
        .delivered_replies()?
        .iter()
        .map(|reply| reply.parent.value())
        .collect();
    assert_eq!(delivered, vec![100, 201]);
    assert_eq!(
        u64::try_from(delivered.len())?,
        counters.sent,
        "delivered replies match the sent counter"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_reply_is_recorded_as_undelivered(api: InMemorySocialApi) -> Result<()> {
    api.reject_replies_to(CommentId::new(1))?;
    let handle = api.connect(&credentials())?;

    let accepted = handle.send_reply(post(10), CommentId::new(1), "Hi").await;

    assert!(!accepted);
    assert_eq!(api.replies()?.len(), 1);
    assert!(api.delivered_replies()?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profiles_are_cached_in_batches_of_one_hundred(api: InMemorySocialApi) -> Result<()> {
    let mut recipients = RecipientSet::new();
    let commentators: Vec<_> = (1..=250).map(|id| (user(id), CommentId::new(5000))).collect();
    recipients.merge_post(post(1), &commentators);
    api.set_user(profile(42))?;
    let store = InMemoryCampaignStore::new();

    sender(&api, &store)
        .send(&recipients, "Hi", &RecordingProgressSink::new())
        .await?;

    assert_eq!(api.user_batches()?, vec![100, 100, 50]);
    assert_eq!(store.user_profile(user(42))?, Some(profile(42)));
    assert_eq!(store.user_profile(user(43))?, None);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_profile_lookup_does_not_block_sending(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    api.fail_lookups(true, false, false)?;
    let store = InMemoryCampaignStore::new();
    store.fail_writes(true)?;
    let recipients =
        collect_recipients(&collector(&api), &[post(10)], &RecordingProgressSink::new()).await?;

    let counters = sender(&api, &store)
        .send(&recipients, "Hi", &RecordingProgressSink::new())
        .await?;

    assert_eq!(counters.sent, 2);
    assert_eq!(api.replies()?.len(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_recipient_set_completes_immediately(api: InMemorySocialApi) -> Result<()> {
    let sink = RecordingProgressSink::new();

    let counters = sender(&api, &InMemoryCampaignStore::new())
        .send(&RecipientSet::new(), "Hi", &sink)
        .await?;

    assert_eq!(counters, SendCounters::for_total(0));
    assert_eq!(
        sink.events(),
        vec![
            ProgressEvent::SendingStarted { total: 0 },
            ProgressEvent::CampaignCompleted { counters }
        ]
    );
    assert!(api.user_batches()?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sink_rejection_stops_sending(api: InMemorySocialApi) -> Result<()> {
    seed_two_posts(&api);
    let recipients =
        collect_recipients(&collector(&api), &[post(10)], &RecordingProgressSink::new()).await?;
    let sink = RecordingProgressSink::rejecting_after(2);

    let result = sender(&api, &InMemoryCampaignStore::new())
        .send(&recipients, "Hi", &sink)
        .await;

    assert!(result.is_err());
    assert_eq!(sink.events().len(), 2);
    assert_eq!(api.replies()?.len(), 2);
    Ok(())
}
