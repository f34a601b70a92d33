//! Operator CLI: migrations, a status overview, and ad-hoc source checks.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use feedrelay_core::{Platform, TrackedAccount};
use feedrelay_sources::{
    FeedSource, FetchResult, PinterestSource, SoundcloudSource, TwitterSource, YoutubeSource,
};

#[derive(Debug, Parser)]
#[command(name = "feedrelay-cli")]
#[command(about = "feedrelay operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Show subscription and dedup-state counts.
    Status,
    /// Fetch one account directly from its platform and print the items.
    /// Does not touch dedup state.
    Check {
        /// pinterest | twitter | youtube | soundcloud
        platform: Platform,
        /// Platform-native account id (user id, channel id, ...)
        account_id: String,
        /// Pinterest board id to scope to
        #[arg(long)]
        board: Option<String>,
        /// Checkpoint/bookmark to resume from
        #[arg(long)]
        checkpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => migrate().await,
        Commands::Status => status().await,
        Commands::Check {
            platform,
            account_id,
            board,
            checkpoint,
        } => check(platform, &account_id, board, checkpoint.as_deref()).await,
    }
}

async fn migrate() -> anyhow::Result<()> {
    let config = feedrelay_core::load_app_config()?;
    let pool = feedrelay_db::connect_pool(
        &config.database_url,
        feedrelay_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    let applied = feedrelay_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

async fn status() -> anyhow::Result<()> {
    let config = feedrelay_core::load_app_config()?;
    let pool = feedrelay_db::connect_pool(
        &config.database_url,
        feedrelay_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    let by_platform = feedrelay_db::count_subscriptions_by_platform(&pool).await?;
    if by_platform.is_empty() {
        println!("no subscriptions");
    } else {
        println!("subscriptions:");
        for (platform, count) in &by_platform {
            println!("  {platform}: {count}");
        }
    }

    let seen = feedrelay_db::count_seen(&pool).await?;
    println!("seen items: {}", seen.seen_items);
    println!("checkpoints: {}", seen.checkpoints);
    Ok(())
}

async fn check(
    platform: Platform,
    account_id: &str,
    board: Option<String>,
    checkpoint: Option<&str>,
) -> anyhow::Result<()> {
    let config = feedrelay_core::load_app_config()?;

    let source: Arc<dyn FeedSource> = match platform {
        Platform::Pinterest => Arc::new(PinterestSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
        Platform::Youtube => Arc::new(YoutubeSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
        Platform::Soundcloud => Arc::new(SoundcloudSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
        Platform::Twitter => {
            let token = config
                .twitter_bearer_token
                .as_deref()
                .context("FEEDRELAY_TWITTER_BEARER_TOKEN is required for twitter checks")?;
            Arc::new(TwitterSource::new(
                token,
                &config.user_agent,
                config.fetch_timeout_secs,
                config.fetch_limit,
            )?)
        }
    };

    let account = TrackedAccount {
        scope: board,
        ..TrackedAccount::new(platform, account_id)
    };

    match source.fetch(&account, checkpoint).await? {
        FetchResult::Empty => println!("no items"),
        FetchResult::Items { items, checkpoint } => {
            println!("{} item(s)", items.len());
            for item in &items {
                println!("  [{}] {} — {}", item.created_at.to_rfc3339(), item.id, item.url);
            }
            if let Some(checkpoint) = checkpoint {
                println!("next checkpoint: {checkpoint}");
            }
        }
    }
    Ok(())
}
