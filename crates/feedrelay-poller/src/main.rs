//! `feedrelayd` — the feedrelay daemon.
//!
//! Wires config, the Postgres pool, the platform sources, and the Discord
//! sink into the supervisor, then parks until SIGINT/SIGTERM and shuts the
//! loops down cleanly.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use feedrelay_discord::DiscordClient;
use feedrelay_poller::{build_supervisor, PgSeenStore, PgSubscriptionStore, PollerDeps};
use feedrelay_sources::{
    FeedSource, PinterestSource, SoundcloudSource, TwitterSource, YoutubeSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = feedrelay_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = feedrelay_db::PoolConfig::from_app_config(&config);
    let pool = feedrelay_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = feedrelay_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let mut sources: Vec<Arc<dyn FeedSource>> = vec![
        Arc::new(PinterestSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
        Arc::new(YoutubeSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
        Arc::new(SoundcloudSource::new(
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?),
    ];
    match &config.twitter_bearer_token {
        Some(token) => sources.push(Arc::new(TwitterSource::new(
            token,
            &config.user_agent,
            config.fetch_timeout_secs,
            config.fetch_limit,
        )?)),
        None => {
            tracing::warn!("FEEDRELAY_TWITTER_BEARER_TOKEN not set; twitter polling disabled");
        }
    }

    let deps = PollerDeps {
        subs: Arc::new(PgSubscriptionStore::new(pool.clone())),
        seen: Arc::new(PgSeenStore::new(pool.clone())),
        sink: Arc::new(DiscordClient::new(
            &config.discord_token,
            &config.user_agent,
            config.send_timeout_secs,
        )?),
    };

    let supervisor = build_supervisor(&config, deps, sources).await?;
    tracing::info!("feedrelayd started");

    shutdown_signal().await;
    supervisor.stop().await?;
    pool.close().await;
    tracing::info!("feedrelayd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
