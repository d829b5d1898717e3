//! Diesel schema for campaign persistence.

diesel::table! {
    /// Campaign task snapshots.
    campaign_tasks (id) {
        /// Short task token.
        #[max_length = 32]
        id -> Varchar,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Target post ids in processing order.
        post_ids -> Jsonb,
        /// Reply text.
        message -> Text,
        /// Delivered replies.
        sent -> Int8,
        /// Failed replies.
        failed -> Int8,
        /// Recipient total.
        total -> Int8,
        /// Bounded log, oldest first.
        log -> Jsonb,
        /// Error text of a failed campaign.
        last_error -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only reply attempts.
    campaign_history (id) {
        /// Surrogate key.
        id -> Int8,
        /// Owning task.
        #[max_length = 32]
        task_id -> Varchar,
        /// Recipient.
        user_id -> Int8,
        /// Anchor post.
        post_id -> Int8,
        /// Anchor comment.
        comment_id -> Int8,
        /// `sent` or `failed`.
        #[max_length = 10]
        outcome -> Varchar,
        /// Delivery time of sent replies.
        sent_at -> Nullable<Timestamptz>,
        /// Failure description.
        error -> Nullable<Text>,
    }
}

diesel::table! {
    /// Daily engagement snapshots of posts.
    post_stats (post_id, group_id, date) {
        /// Post identifier.
        post_id -> Int8,
        /// Owning community.
        group_id -> Int8,
        /// Snapshot day.
        date -> Date,
        /// View count.
        views -> Int8,
        /// Like count.
        likes -> Int8,
        /// Comment count.
        comments -> Int8,
        /// Repost count.
        reposts -> Int8,
        /// Snapshot time.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cached recipient profiles.
    user_profiles (user_id) {
        /// User identifier.
        user_id -> Int8,
        /// First name.
        first_name -> Text,
        /// Last name.
        last_name -> Text,
        /// Avatar URL.
        photo_url -> Text,
        /// Last time seen online.
        last_seen -> Nullable<Timestamptz>,
        /// Refresh time.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cached community metadata.
    group_info (group_id) {
        /// Community identifier.
        group_id -> Int8,
        /// Display name.
        name -> Text,
        /// Short address.
        screen_name -> Text,
        /// Description.
        description -> Text,
        /// Member count.
        members_count -> Int8,
        /// Avatar URL.
        photo_url -> Text,
        /// Refresh time.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    campaign_tasks,
    campaign_history,
    post_stats,
    user_profiles,
    group_info,
);
