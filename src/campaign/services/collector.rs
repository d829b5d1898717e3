//! Comment collection and cross-post deduplication.

use crate::campaign::{
    domain::{ProgressEvent, RecipientSet},
    ports::{ProgressSink, ProgressSinkResult},
};
use crate::social::{
    domain::{CommentId, PostId, UserId},
    ports::SocialApi,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Number of comments requested per page.
pub const COMMENT_PAGE_SIZE: u64 = 100;

/// Pages through the comments of one post.
pub struct CommentCollector<A>
where
    A: SocialApi + ?Sized,
{
    api: Arc<A>,
    delay: Duration,
}

impl<A> CommentCollector<A>
where
    A: SocialApi + ?Sized,
{
    /// Creates a collector sleeping `delay` between page fetches.
    #[must_use]
    pub const fn new(api: Arc<A>, delay: Duration) -> Self {
        Self { api, delay }
    }

    /// Returns each distinct author of `post_id` with their first comment,
    /// in thread order.
    ///
    /// Community and deleted authors are skipped. Paging stops at the first
    /// short or empty page. A listing failure is reported as an `error`
    /// event and ends paging for this post, keeping what was read so far.
    ///
    /// # Errors
    ///
    /// Returns an error only when the sink rejects an event.
    pub async fn collect(
        &self,
        post_id: PostId,
        sink: &dyn ProgressSink,
    ) -> ProgressSinkResult<Vec<(UserId, CommentId)>> {
        let mut offset = 0_u64;
        let mut seen = HashSet::new();
        let mut commentators = Vec::new();

        loop {
            let page = match self
                .api
                .list_comments(post_id, offset, COMMENT_PAGE_SIZE)
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    warn!(post_id = %post_id, offset, error = %err, "comment listing failed");
                    sink.emit(ProgressEvent::Error {
                        message: format!("Failed to read comments of post {post_id}: {err}"),
                    })
                    .await?;
                    break;
                }
            };
            if page.is_empty() {
                break;
            }

            let page_len = u64::try_from(page.len()).unwrap_or(u64::MAX);
            for comment in &page {
                if let Some(user_id) = comment.user()
                    && seen.insert(user_id)
                {
                    commentators.push((user_id, comment.id));
                }
            }

            sink.emit(ProgressEvent::CollectingPage {
                post_id,
                loaded: offset.saturating_add(page_len),
                unique: count(commentators.len()),
            })
            .await?;

            if page_len < COMMENT_PAGE_SIZE {
                break;
            }
            offset = offset.saturating_add(COMMENT_PAGE_SIZE);
            tokio::time::sleep(self.delay).await;
        }

        Ok(commentators)
    }
}

/// Collects every post in order and merges the results, first post wins.
///
/// Emits `post-collected` after each post with the post-local unique count
/// and the running cross-post total.
///
/// # Errors
///
/// Returns an error only when the sink rejects an event.
pub async fn collect_recipients<A>(
    collector: &CommentCollector<A>,
    post_ids: &[PostId],
    sink: &dyn ProgressSink,
) -> ProgressSinkResult<RecipientSet>
where
    A: SocialApi + ?Sized,
{
    let mut recipients = RecipientSet::new();
    for &post_id in post_ids {
        info!(post_id = %post_id, "reading comments");
        let commentators = collector.collect(post_id, sink).await?;
        recipients.merge_post(post_id, &commentators);
        sink.emit(ProgressEvent::PostCollected {
            post_id,
            unique: count(commentators.len()),
            unique_total: count(recipients.len()),
        })
        .await?;
    }
    Ok(recipients)
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
