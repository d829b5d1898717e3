//! Command-line front end for commentcast.
//!
//! Usage:
//!
//! ```text
//! commentcast [--config data/config.json] send 101 102 --message "Thanks!"
//! commentcast watch 103 --seconds 600
//! commentcast posts --limit 10
//! commentcast group
//! commentcast tasks --limit 20
//! commentcast task <task-id>
//! commentcast use <group-id>
//! ```
//!
//! Campaign tasks are kept in memory unless `--database-url` (or
//! `DATABASE_URL`) points at a `PostgreSQL` database with the schema from
//! `migrations/` applied.

use clap::{Parser, Subcommand};
use commentcast::campaign::{
    adapters::{
        memory::InMemoryCampaignStore,
        postgres::{CampaignPgPool, PostgresCampaignStore},
    },
    domain::{CampaignTask, TaskId},
    ports::CampaignStore,
    services::{CampaignService, CommunityInfoService, SubmitCampaignRequest},
};
use commentcast::config::{BotConfig, DEFAULT_CONFIG_PATH, load_config, save_config};
use commentcast::social::{adapters::vk::VkApiFactory, domain::text_preview};
use commentcast::telemetry;
use commentcast::watcher::services::{WatchService, WatchTimings};
use diesel::{PgConnection, r2d2::ConnectionManager};
use eyre::{Result, eyre};
use mockable::DefaultClock;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const PREVIEW_LIMIT: usize = 120;

#[derive(Parser)]
#[command(name = "commentcast", version, about = "Reply to everyone who commented on a post")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level for this crate when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// `PostgreSQL` connection string for durable task storage.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reply once to every commenter of the given posts.
    Send {
        /// Post ids; the configured ones are used when omitted.
        posts: Vec<i64>,
        /// Reply text; saved as the new default.
        #[arg(long)]
        message: Option<String>,
    },
    /// Answer new comments on one post until the time runs out.
    Watch {
        /// Post to watch.
        post: i64,
        /// Reply text; the configured default when omitted.
        #[arg(long)]
        message: Option<String>,
        /// How long to keep watching.
        #[arg(long, default_value_t = 300)]
        seconds: u64,
    },
    /// List the latest wall posts.
    Posts {
        /// Number of posts, at most 100.
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Show community metadata.
    Group,
    /// List stored campaign tasks, newest first.
    Tasks {
        /// Page size.
        #[arg(long, default_value_t = 20)]
        limit: u64,
        /// Rows to skip.
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Show one campaign task with its reply statistics.
    Task {
        /// Task identifier.
        id: String,
    },
    /// Make a configured community the active one.
    Use {
        /// Community id.
        group_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level)
        .map_err(|err| eyre!("failed to install the log subscriber: {err}"))?;
    let config = load_config(&cli.config)?;

    if let Some(url) = cli.database_url.as_deref() {
        let pool = CampaignPgPool::builder().build(ConnectionManager::<PgConnection>::new(url))?;
        let store = Arc::new(PostgresCampaignStore::new(pool));
        run(cli.command, &cli.config, config, store).await
    } else {
        let store = Arc::new(InMemoryCampaignStore::new());
        run(cli.command, &cli.config, config, store).await
    }
}

async fn run<S>(command: Command, config_path: &Path, config: BotConfig, store: Arc<S>) -> Result<()>
where
    S: CampaignStore + 'static,
{
    let factory = Arc::new(VkApiFactory::new()?);
    let clock = Arc::new(DefaultClock);
    let mut out = io::stdout();

    match command {
        Command::Send { posts, message } => {
            let service = CampaignService::new(factory, store, clock, config.campaign_settings());
            send(&service, config_path, config, posts, message, &mut out).await
        }
        Command::Watch {
            post,
            message,
            seconds,
        } => {
            let timings = WatchTimings::with_reply_delay(config.request_delay.as_duration());
            let service = WatchService::new(factory, clock, timings);
            let message = message.unwrap_or_else(|| config.promo_message.clone());
            let credentials = config.active_credentials();
            let state = service.start(post, &message, credentials.as_ref())?;
            writeln!(out, "Watching post {post} as {}", state.id())?;

            tokio::time::sleep(Duration::from_secs(seconds)).await;
            service.stop(state.id())?;
            service.wait(state.id()).await?;
            if let Some(state) = service.get(state.id())? {
                writeln!(out, "Replied {}, errors {}", state.replied(), state.errors())?;
                write_log(&mut out, &state.log().lines())?;
            }
            Ok(())
        }
        Command::Posts { limit } => {
            let service = community_service(&config, factory, store, clock)?;
            for post in service.list_posts(limit).await? {
                let id = post.id.map_or_else(|| "?".to_owned(), |id| id.to_string());
                let date = post
                    .published_at
                    .map_or_else(String::new, |at| at.format("%Y-%m-%d %H:%M").to_string());
                writeln!(
                    out,
                    "{id:>8} {date} views {} likes {} comments {} reposts {}",
                    post.views, post.likes, post.comments, post.reposts
                )?;
                writeln!(out, "         {}", text_preview(&post.text, PREVIEW_LIMIT))?;
            }
            Ok(())
        }
        Command::Group => {
            let service = community_service(&config, factory, store, clock)?;
            let group = service.group_info().await?;
            writeln!(
                out,
                "{} (@{}), {} members",
                group.name, group.screen_name, group.members_count
            )?;
            if !group.description.is_empty() {
                writeln!(out, "{}", text_preview(&group.description, PREVIEW_LIMIT))?;
            }
            Ok(())
        }
        Command::Tasks { limit, offset } => {
            let service = CampaignService::new(factory, store, clock, config.campaign_settings());
            for task in service.list_task_snapshots(limit, offset).await? {
                write_task_line(&mut out, &task)?;
            }
            Ok(())
        }
        Command::Task { id } => {
            let service = CampaignService::new(factory, store, clock, config.campaign_settings());
            let task_id = TaskId::parse(&id)?;
            let task = service
                .task_snapshot(&task_id)
                .await?
                .ok_or_else(|| eyre!("task {task_id} not found"))?;
            write_task(&mut out, &task)?;
            let stats = service.campaign_stats(&task_id).await?;
            writeln!(
                out,
                "History: {} attempts, {} sent, {} failed",
                stats.total, stats.sent, stats.failed
            )?;
            Ok(())
        }
        Command::Use { group_id } => {
            let mut config = config;
            config.set_active_community(group_id)?;
            save_config(config_path, &config)?;
            writeln!(out, "Active community is now {group_id}")?;
            Ok(())
        }
    }
}

async fn send<F, S, C>(
    service: &CampaignService<F, S, C>,
    config_path: &Path,
    mut config: BotConfig,
    posts: Vec<i64>,
    message: Option<String>,
    out: &mut impl Write,
) -> Result<()>
where
    F: commentcast::social::ports::SocialApiFactory,
    S: CampaignStore + 'static,
    C: mockable::Clock + Send + Sync + 'static,
{
    let posts = if posts.is_empty() {
        config.post_ids.clone()
    } else {
        posts
    };
    let request = SubmitCampaignRequest::new(posts.clone())
        .with_credentials(config.active_credentials());
    let request = match message.as_deref() {
        Some(text) => request.with_message(text),
        None => request,
    };
    let task = service.submit(request).await?;
    writeln!(out, "Started campaign {}", task.id())?;

    let changed_message = message.filter(|text| text.trim() != config.promo_message);
    if changed_message.is_some() || config.post_ids != posts {
        if let Some(text) = changed_message {
            config.promo_message = text.trim().to_owned();
        }
        config.post_ids = posts;
        save_config(config_path, &config)?;
        info!(path = %config_path.display(), "configuration updated");
    }

    let mut reported = 0;
    loop {
        let Some(snapshot) = service.task_snapshot(task.id()).await? else {
            break;
        };
        let counters = snapshot.counters();
        if counters.sent + counters.failed != reported {
            reported = counters.sent + counters.failed;
            writeln!(
                out,
                "{}: {} of {} (failed {})",
                snapshot.status(),
                reported,
                counters.total,
                counters.failed
            )?;
        }
        if snapshot.status().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    service.wait(task.id()).await?;

    if let Some(finished) = service.task_snapshot(task.id()).await? {
        write_task(out, &finished)?;
    }
    Ok(())
}

fn community_service<F, S>(
    config: &BotConfig,
    factory: Arc<F>,
    store: Arc<S>,
    clock: Arc<DefaultClock>,
) -> Result<CommunityInfoService<F, S, DefaultClock>>
where
    F: commentcast::social::ports::SocialApiFactory,
    S: CampaignStore,
{
    let credentials = config
        .active_credentials()
        .ok_or_else(|| eyre!("no active community is configured"))?;
    Ok(CommunityInfoService::new(factory, store, clock, credentials))
}

fn write_task_line(out: &mut impl Write, task: &CampaignTask) -> io::Result<()> {
    let counters = task.counters();
    writeln!(
        out,
        "{} {:<10} {} sent {}/{} failed {}",
        task.id(),
        task.status().as_str(),
        task.created_at().format("%Y-%m-%d %H:%M"),
        counters.sent,
        counters.total,
        counters.failed
    )
}

fn write_task(out: &mut impl Write, task: &CampaignTask) -> io::Result<()> {
    write_task_line(out, task)?;
    if let Some(error) = task.error() {
        writeln!(out, "Error: {error}")?;
    }
    write_log(out, &task.log().lines())
}

fn write_log(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}
