//! One poll/dispatch cycle for one platform.
//!
//! Flow per account: fetch (with timeout) → staleness filter → dedup filter →
//! mark seen → fan out to subscriptions. Items are marked seen *before*
//! delivery is attempted: seen-state tracks "observed", not "successfully
//! delivered", which keeps announcements at-most-once after partial outages
//! at the cost of a destination occasionally missing an item. The right
//! trade for a notification feed; the wrong one for an audit log.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use feedrelay_core::{AppConfig, FeedItem, TrackedAccount};
use feedrelay_discord::{send_with_retry, ChannelSink, SinkError};
use feedrelay_sources::{FeedSource, FetchResult};

use crate::dead::DeadChannelQueue;
use crate::render::{render_messages, subscription_items};
use crate::stores::{SeenStore, SubscriptionStore};

const DEAD_QUEUE_CAPACITY: usize = 1024;

/// Per-cycle knobs, lifted out of [`AppConfig`] so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct CycleConfig {
    pub staleness_secs: u64,
    pub fetch_timeout_secs: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub delivery_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub plain_batch_size: usize,
}

impl CycleConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            staleness_secs: config.staleness_secs,
            fetch_timeout_secs: config.fetch_timeout_secs,
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
            delivery_retries: config.delivery_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            plain_batch_size: config.plain_batch_size,
        }
    }
}

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub accounts: usize,
    pub unavailable: usize,
    pub announced: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub dead_channels: usize,
}

#[derive(Debug, Default)]
struct AccountOutcome {
    unavailable: bool,
    announced: usize,
    delivered: usize,
    failed: usize,
    dead: Vec<i64>,
}

/// Run one cycle for the platform served by `source`.
///
/// Accounts are fetched concurrently, each task staggered by a small random
/// delay so a cycle does not burst the platform API with simultaneous
/// requests. If the registry cannot be listed the cycle is skipped outright —
/// guessing at subscriptions is worse than a late announcement.
pub async fn run_cycle(
    source: Arc<dyn FeedSource>,
    subs: Arc<dyn SubscriptionStore>,
    seen: Arc<dyn SeenStore>,
    sink: Arc<dyn ChannelSink>,
    config: CycleConfig,
) -> CycleStats {
    let platform = source.platform();

    let accounts = match subs.list_tracked_accounts(platform).await {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::error!(%platform, error = %e, "registry unavailable; skipping cycle");
            return CycleStats::default();
        }
    };

    let mut stats = CycleStats {
        accounts: accounts.len(),
        ..CycleStats::default()
    };
    if accounts.is_empty() {
        return stats;
    }

    let mut handles = Vec::with_capacity(accounts.len());
    for account in accounts {
        let source = Arc::clone(&source);
        let subs = Arc::clone(&subs);
        let seen = Arc::clone(&seen);
        let sink = Arc::clone(&sink);
        handles.push(tokio::spawn(async move {
            let delay = rand::random_range(config.jitter_min_ms..=config.jitter_max_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            poll_account(
                source.as_ref(),
                subs.as_ref(),
                seen.as_ref(),
                sink.as_ref(),
                &account,
                &config,
            )
            .await
        }));
    }

    let mut dead = DeadChannelQueue::new(DEAD_QUEUE_CAPACITY);
    for handle in futures::future::join_all(handles).await {
        match handle {
            Ok(outcome) => {
                stats.unavailable += usize::from(outcome.unavailable);
                stats.announced += outcome.announced;
                stats.delivered += outcome.delivered;
                stats.failed_deliveries += outcome.failed;
                for channel_id in outcome.dead {
                    dead.push(channel_id);
                }
            }
            Err(e) => {
                // One misbehaving account must not take down the cycle.
                tracing::error!(%platform, error = %e, "account task panicked");
            }
        }
    }

    if !dead.is_empty() {
        let channel_ids = dead.drain();
        stats.dead_channels = channel_ids.len();
        match subs.remove_channels(&channel_ids).await {
            Ok(removed) => {
                tracing::info!(
                    %platform,
                    channels = channel_ids.len(),
                    removed,
                    "pruned dead destinations"
                );
            }
            Err(e) => {
                // The sends will fail again next cycle and re-queue them.
                tracing::warn!(%platform, error = %e, "failed to prune dead destinations");
            }
        }
    }

    stats
}

async fn poll_account(
    source: &dyn FeedSource,
    subs: &dyn SubscriptionStore,
    seen: &dyn SeenStore,
    sink: &dyn ChannelSink,
    account: &TrackedAccount,
    config: &CycleConfig,
) -> AccountOutcome {
    let mut outcome = AccountOutcome::default();
    let platform = account.platform;
    let key = account.dedup_key();

    let checkpoint = match seen.checkpoint(&key).await {
        Ok(checkpoint) => checkpoint,
        Err(e) => {
            tracing::error!(%platform, account = %account.external_id, error = %e, "dedup store unavailable; skipping account");
            return outcome;
        }
    };

    let fetch = source.fetch(account, checkpoint.as_deref());
    let fetched = match tokio::time::timeout(Duration::from_secs(config.fetch_timeout_secs), fetch)
        .await
    {
        Err(_elapsed) => {
            tracing::warn!(%platform, account = %account.external_id, "fetch timed out");
            outcome.unavailable = true;
            return outcome;
        }
        Ok(Err(e)) => {
            tracing::warn!(%platform, account = %account.external_id, error = %e, "source unavailable");
            outcome.unavailable = true;
            return outcome;
        }
        Ok(Ok(result)) => result,
    };

    let (items, next_checkpoint) = match fetched {
        FetchResult::Empty => {
            if checkpoint.is_some() {
                // Backlog drained: forget old ids to bound the seen-set.
                match seen.reset(&key).await {
                    Ok(()) => {
                        tracing::debug!(%platform, account = %account.external_id, "feed drained; dedup state reset");
                    }
                    Err(e) => {
                        tracing::error!(%platform, account = %account.external_id, error = %e, "dedup reset failed");
                    }
                }
            }
            return outcome;
        }
        FetchResult::Items { items, checkpoint } => (items, checkpoint),
    };

    // Items that arrive late (backfills, reposts surfacing old entries) are
    // not news; drop them before dedup so they stay eligible if they ever
    // reappear with a fresh timestamp.
    #[allow(clippy::cast_possible_wrap)]
    let cutoff = Utc::now() - chrono::Duration::seconds(config.staleness_secs as i64);
    let fresh: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| item.created_at >= cutoff)
        .collect();

    let fresh_ids: Vec<String> = fresh.iter().map(|item| item.id.clone()).collect();
    let already_seen = match seen.filter_seen(&key, &fresh_ids).await {
        Ok(seen_ids) => seen_ids,
        Err(e) => {
            tracing::error!(%platform, account = %account.external_id, error = %e, "dedup store unavailable; skipping account");
            return outcome;
        }
    };

    let mut to_announce: Vec<FeedItem> = fresh
        .into_iter()
        .filter(|item| !already_seen.contains(&item.id))
        .collect();

    // Advance the cursor even when every item was stale or already seen, so
    // the next fetch resumes past this page.
    if let Some(next) = &next_checkpoint {
        if let Err(e) = seen.set_checkpoint(&key, next).await {
            tracing::error!(%platform, account = %account.external_id, error = %e, "checkpoint write failed; skipping account");
            return outcome;
        }
    }

    if to_announce.is_empty() {
        return outcome;
    }

    // Oldest first reads naturally when several items land in one cycle.
    to_announce.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    // The registry read comes before the dedup write: if we cannot know who
    // wanted these items, we must not burn them as seen.
    let subscriptions = match subs.subscriptions_for(account).await {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            tracing::error!(%platform, account = %account.external_id, error = %e, "registry unavailable; skipping account");
            return outcome;
        }
    };

    let announce_ids: Vec<String> = to_announce.iter().map(|item| item.id.clone()).collect();
    if let Err(e) = seen.mark_seen(&key, &announce_ids).await {
        tracing::error!(%platform, account = %account.external_id, error = %e, "mark_seen failed; skipping account");
        return outcome;
    }
    outcome.announced = to_announce.len();

    tracing::info!(
        %platform,
        account = %account.external_id,
        new_items = to_announce.len(),
        subscriptions = subscriptions.len(),
        "announcing new items"
    );

    for subscription in &subscriptions {
        let wanted = subscription_items(subscription, &to_announce);
        let messages = render_messages(subscription, account, &wanted, config.plain_batch_size);
        for message in &messages {
            match send_with_retry(
                sink,
                subscription.channel_id,
                message,
                config.delivery_retries,
                config.retry_backoff_base_ms,
            )
            .await
            {
                Ok(_) => outcome.delivered += 1,
                Err(SinkError::Gone { status }) => {
                    tracing::info!(
                        %platform,
                        channel_id = subscription.channel_id,
                        status,
                        "destination gone; queueing cleanup"
                    );
                    outcome.dead.push(subscription.channel_id);
                    break;
                }
                Err(e) => {
                    // The item stays seen; this one destination misses it.
                    tracing::warn!(
                        %platform,
                        channel_id = subscription.channel_id,
                        error = %e,
                        "delivery dropped after retries"
                    );
                    outcome.failed += 1;
                }
            }
        }
    }

    outcome
}
