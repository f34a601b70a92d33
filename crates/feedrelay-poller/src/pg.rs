//! Postgres-backed store implementations, delegating to the query layer.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use feedrelay_core::{Platform, Subscription, TrackedAccount};

use crate::stores::{SeenStore, StoreError, SubscriptionStore};

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn list_tracked_accounts(
        &self,
        platform: Platform,
    ) -> Result<Vec<TrackedAccount>, StoreError> {
        Ok(feedrelay_db::list_tracked_accounts(&self.pool, platform).await?)
    }

    async fn subscriptions_for(
        &self,
        account: &TrackedAccount,
    ) -> Result<Vec<Subscription>, StoreError> {
        Ok(feedrelay_db::subscriptions_for(&self.pool, account).await?)
    }

    async fn remove_channels(&self, channel_ids: &[i64]) -> Result<u64, StoreError> {
        Ok(feedrelay_db::delete_channels(&self.pool, channel_ids).await?)
    }
}

#[derive(Clone)]
pub struct PgSeenStore {
    pool: PgPool,
}

impl PgSeenStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeenStore for PgSeenStore {
    async fn filter_seen(
        &self,
        dedup_key: &str,
        item_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        Ok(feedrelay_db::filter_seen(&self.pool, dedup_key, item_ids).await?)
    }

    async fn mark_seen(&self, dedup_key: &str, item_ids: &[String]) -> Result<(), StoreError> {
        Ok(feedrelay_db::mark_seen(&self.pool, dedup_key, item_ids).await?)
    }

    async fn checkpoint(&self, dedup_key: &str) -> Result<Option<String>, StoreError> {
        Ok(feedrelay_db::get_checkpoint(&self.pool, dedup_key).await?)
    }

    async fn set_checkpoint(&self, dedup_key: &str, value: &str) -> Result<(), StoreError> {
        Ok(feedrelay_db::set_checkpoint(&self.pool, dedup_key, value).await?)
    }

    async fn reset(&self, dedup_key: &str) -> Result<(), StoreError> {
        Ok(feedrelay_db::reset(&self.pool, dedup_key).await?)
    }
}
