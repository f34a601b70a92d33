//! Background job supervisor.
//!
//! Registers one repeated poll job per enabled platform on a
//! [`JobScheduler`] and owns the scheduler handle. The handle must be kept
//! alive for the lifetime of the process; [`Supervisor::stop`] shuts every
//! loop down and awaits the scheduler, so nothing keeps running against a
//! torn-down pool after the daemon exits.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use feedrelay_core::{AppConfig, Platform};
use feedrelay_discord::ChannelSink;
use feedrelay_sources::FeedSource;

use crate::cycle::{run_cycle, CycleConfig};
use crate::stores::{SeenStore, SubscriptionStore};

/// Shared collaborators every platform job needs.
#[derive(Clone)]
pub struct PollerDeps {
    pub subs: Arc<dyn SubscriptionStore>,
    pub seen: Arc<dyn SeenStore>,
    pub sink: Arc<dyn ChannelSink>,
}

/// Owns the running scheduler; dropping it without [`Supervisor::stop`]
/// shuts the jobs down without awaiting them.
pub struct Supervisor {
    scheduler: JobScheduler,
}

impl Supervisor {
    /// Stop all platform loops and await scheduler shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler fails to shut down.
    pub async fn stop(mut self) -> Result<(), JobSchedulerError> {
        self.scheduler.shutdown().await
    }
}

/// Build and start the supervisor with one poll job per source.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_supervisor(
    config: &AppConfig,
    deps: PollerDeps,
    sources: Vec<Arc<dyn FeedSource>>,
) -> Result<Supervisor, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let cycle_config = CycleConfig::from_app_config(config);

    for source in sources {
        let interval = poll_interval_secs(config, source.platform());
        register_platform_job(&scheduler, source, deps.clone(), cycle_config, interval).await?;
    }

    scheduler.start().await?;
    Ok(Supervisor { scheduler })
}

fn poll_interval_secs(config: &AppConfig, platform: Platform) -> u64 {
    match platform {
        Platform::Pinterest => config.pinterest_interval_secs,
        Platform::Twitter => config.twitter_interval_secs,
        Platform::Youtube => config.youtube_interval_secs,
        Platform::Soundcloud => config.soundcloud_interval_secs,
    }
}

/// Register one repeated poll job for `source`'s platform.
///
/// A cycle that outlives the interval is not overlapped: the next tick finds
/// the in-flight guard held and skips, leaving the slow cycle to finish.
async fn register_platform_job(
    scheduler: &JobScheduler,
    source: Arc<dyn FeedSource>,
    deps: PollerDeps,
    cycle_config: CycleConfig,
    interval_secs: u64,
) -> Result<(), JobSchedulerError> {
    let platform = source.platform();
    let in_flight = Arc::new(tokio::sync::Mutex::new(()));

    let job = Job::new_repeated_async(
        std::time::Duration::from_secs(interval_secs),
        move |_uuid, _lock| {
            let source = Arc::clone(&source);
            let deps = deps.clone();
            let in_flight = Arc::clone(&in_flight);

            Box::pin(async move {
                let Ok(_guard) = in_flight.try_lock() else {
                    tracing::warn!(%platform, "previous cycle still running; skipping tick");
                    return;
                };
                let stats = run_cycle(
                    source,
                    deps.subs,
                    deps.seen,
                    deps.sink,
                    cycle_config,
                )
                .await;
                tracing::info!(
                    %platform,
                    accounts = stats.accounts,
                    unavailable = stats.unavailable,
                    announced = stats.announced,
                    delivered = stats.delivered,
                    failed = stats.failed_deliveries,
                    dead_channels = stats.dead_channels,
                    "cycle complete"
                );
            })
        },
    )?;

    scheduler.add(job).await?;
    tracing::info!(%platform, interval_secs, "registered poll job");
    Ok(())
}
