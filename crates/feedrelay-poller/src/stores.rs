//! Capability traits over the durable registry and dedup state.
//!
//! The cycle logic only speaks these traits; production wires them to
//! Postgres (see [`crate::pg`]), tests wire them to in-memory maps.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use feedrelay_core::{Platform, Subscription, TrackedAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] feedrelay_db::DbError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping of tracked accounts to interested destinations.
///
/// Read-only from the poller's perspective except for the batched
/// dead-channel delete.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Distinct polling units for one platform; never returns duplicates even
    /// when many subscriptions reference the same account.
    async fn list_tracked_accounts(
        &self,
        platform: Platform,
    ) -> Result<Vec<TrackedAccount>, StoreError>;

    async fn subscriptions_for(
        &self,
        account: &TrackedAccount,
    ) -> Result<Vec<Subscription>, StoreError>;

    /// Delete every subscription pointing at the given channels, in one batch.
    async fn remove_channels(&self, channel_ids: &[i64]) -> Result<u64, StoreError>;
}

/// Persistent "have we announced this id" set plus pagination checkpoint,
/// per dedup key.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Return the subset of `item_ids` already seen under `dedup_key`.
    async fn filter_seen(
        &self,
        dedup_key: &str,
        item_ids: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    /// Record a batch of ids as seen; called once per account per cycle.
    async fn mark_seen(&self, dedup_key: &str, item_ids: &[String]) -> Result<(), StoreError>;

    async fn checkpoint(&self, dedup_key: &str) -> Result<Option<String>, StoreError>;

    async fn set_checkpoint(&self, dedup_key: &str, value: &str) -> Result<(), StoreError>;

    /// Clear both the seen-set and the checkpoint for `dedup_key`.
    async fn reset(&self, dedup_key: &str) -> Result<(), StoreError>;
}
