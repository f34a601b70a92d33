//! Subscription registry queries.
//!
//! The poller reads subscriptions and derives tracked accounts from them;
//! the only mutation it performs is the batched dead-channel delete. Row
//! creation belongs to the (external) configuration surface, but an upsert
//! is provided for seeding and tests.

use crate::DbError;
use chrono::{DateTime, Utc};
use feedrelay_core::{Platform, Subscription, TrackedAccount};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub guild_id: i64,
    pub channel_id: i64,
    pub platform: String,
    pub account_id: String,
    pub account_name: String,
    pub board: Option<String>,
    pub board_id: Option<String>,
    pub embeds: bool,
    pub only_new: bool,
    pub shorts: bool,
    pub template: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert the raw row into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidPlatform`] if the stored platform string is
    /// not one the CHECK constraint should have allowed.
    pub fn into_domain(self) -> Result<Subscription, DbError> {
        let platform = self
            .platform
            .parse::<Platform>()
            .map_err(|_| DbError::InvalidPlatform(self.platform.clone()))?;
        Ok(Subscription {
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            platform,
            account_id: self.account_id,
            account_name: self.account_name,
            board: self.board,
            board_id: self.board_id,
            embeds: self.embeds,
            only_new: self.only_new,
            shorts: self.shorts,
            template: self.template,
            created_at: self.created_at,
        })
    }
}

pub struct NewSubscription<'a> {
    pub guild_id: i64,
    pub channel_id: i64,
    pub platform: Platform,
    pub account_id: &'a str,
    pub account_name: &'a str,
    pub board: Option<&'a str>,
    pub board_id: Option<&'a str>,
    pub embeds: bool,
    pub only_new: bool,
    pub shorts: bool,
    pub template: Option<&'a str>,
}

/// Upsert a subscription. Returns the internal ID.
///
/// Conflict key is `(guild_id, platform, account_id)`: re-adding a feed in a
/// guild moves it to the new channel and refreshes its options.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn insert_subscription(
    pool: &PgPool,
    sub: &NewSubscription<'_>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO subscriptions \
           (guild_id, channel_id, platform, account_id, account_name, \
            board, board_id, embeds, only_new, shorts, template) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (guild_id, platform, account_id) DO UPDATE SET \
           channel_id = EXCLUDED.channel_id, \
           board = EXCLUDED.board, \
           board_id = EXCLUDED.board_id, \
           embeds = EXCLUDED.embeds, \
           only_new = EXCLUDED.only_new, \
           shorts = EXCLUDED.shorts, \
           template = EXCLUDED.template \
         RETURNING id",
    )
    .bind(sub.guild_id)
    .bind(sub.channel_id)
    .bind(sub.platform.as_str())
    .bind(sub.account_id)
    .bind(sub.account_name)
    .bind(sub.board)
    .bind(sub.board_id)
    .bind(sub.embeds)
    .bind(sub.only_new)
    .bind(sub.shorts)
    .bind(sub.template)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Distinct polling units for one platform.
///
/// A polling unit is `(account_id, board_id)`: the same account tracked with
/// and without a board scope is two units with independent dedup state. The
/// display name is arbitrary among the referencing rows, so take the minimum
/// for determinism.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_tracked_accounts(
    pool: &PgPool,
    platform: Platform,
) -> Result<Vec<TrackedAccount>, DbError> {
    let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
        "SELECT account_id, MIN(account_name) AS account_name, board_id \
         FROM subscriptions \
         WHERE platform = $1 \
         GROUP BY account_id, board_id \
         ORDER BY account_id",
    )
    .bind(platform.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(external_id, display_name, scope)| TrackedAccount {
            platform,
            external_id,
            display_name,
            scope,
        })
        .collect())
}

/// All subscriptions interested in one tracked account.
///
/// # Errors
///
/// Returns `DbError` on database query failure or if a row holds an unknown
/// platform string.
pub async fn subscriptions_for(
    pool: &PgPool,
    account: &TrackedAccount,
) -> Result<Vec<Subscription>, DbError> {
    let rows = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT id, public_id, guild_id, channel_id, platform, account_id, \
                account_name, board, board_id, embeds, only_new, shorts, \
                template, created_at \
         FROM subscriptions \
         WHERE platform = $1 \
           AND account_id = $2 \
           AND board_id IS NOT DISTINCT FROM $3 \
         ORDER BY id",
    )
    .bind(account.platform.as_str())
    .bind(&account.external_id)
    .bind(account.scope.as_deref())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SubscriptionRow::into_domain).collect()
}

/// Delete every subscription pointing at any of the given channels.
///
/// One statement for the whole batch; the poller queues dead channels over a
/// cycle and flushes them here. Returns the number of deleted rows.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn delete_channels(pool: &PgPool, channel_ids: &[i64]) -> Result<u64, DbError> {
    if channel_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("DELETE FROM subscriptions WHERE channel_id = ANY($1)")
        .bind(channel_ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Subscription counts per platform, for the operator status view.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn count_subscriptions_by_platform(
    pool: &PgPool,
) -> Result<Vec<(String, i64)>, DbError> {
    Ok(sqlx::query_as::<_, (String, i64)>(
        "SELECT platform, COUNT(*) FROM subscriptions GROUP BY platform ORDER BY platform",
    )
    .fetch_all(pool)
    .await?)
}
