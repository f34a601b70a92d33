//! Dedup store queries: seen item ids and pagination checkpoints.
//!
//! Keys are the namespaced dedup keys produced by
//! [`feedrelay_core::TrackedAccount::dedup_key`], so two platforms (or two
//! scopes of one account) never contend on the same rows.

use std::collections::HashSet;

use crate::DbError;
use sqlx::PgPool;

/// Check a single item id against the seen-set.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn is_seen(pool: &PgPool, dedup_key: &str, item_id: &str) -> Result<bool, DbError> {
    let found = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM seen_items WHERE dedup_key = $1 AND item_id = $2",
    )
    .bind(dedup_key)
    .bind(item_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

/// Return the subset of `item_ids` already recorded as seen.
///
/// One round-trip for the whole candidate batch.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn filter_seen(
    pool: &PgPool,
    dedup_key: &str,
    item_ids: &[String],
) -> Result<HashSet<String>, DbError> {
    if item_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT item_id FROM seen_items WHERE dedup_key = $1 AND item_id = ANY($2)",
    )
    .bind(dedup_key)
    .bind(item_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Record a batch of item ids as seen. Idempotent.
///
/// Called once per account per cycle with every item about to be announced;
/// re-marking an already-seen id is a no-op.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn mark_seen(pool: &PgPool, dedup_key: &str, item_ids: &[String]) -> Result<(), DbError> {
    if item_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO seen_items (dedup_key, item_id) \
         SELECT $1, UNNEST($2::TEXT[]) \
         ON CONFLICT (dedup_key, item_id) DO NOTHING",
    )
    .bind(dedup_key)
    .bind(item_ids)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch the pagination checkpoint for a polling unit, if any.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_checkpoint(pool: &PgPool, dedup_key: &str) -> Result<Option<String>, DbError> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT checkpoint FROM feed_checkpoints WHERE dedup_key = $1",
    )
    .bind(dedup_key)
    .fetch_optional(pool)
    .await?)
}

/// Upsert the pagination checkpoint for a polling unit.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn set_checkpoint(pool: &PgPool, dedup_key: &str, value: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO feed_checkpoints (dedup_key, checkpoint, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (dedup_key) DO UPDATE SET \
           checkpoint = EXCLUDED.checkpoint, \
           updated_at = NOW()",
    )
    .bind(dedup_key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear both the seen-set and the checkpoint for a polling unit.
///
/// Invoked when a source reports an exhausted backlog (empty fetch with a
/// live checkpoint), which bounds seen-set growth. Both deletes commit
/// together or not at all.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn reset(pool: &PgPool, dedup_key: &str) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM seen_items WHERE dedup_key = $1")
        .bind(dedup_key)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM feed_checkpoints WHERE dedup_key = $1")
        .bind(dedup_key)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Seen-set and checkpoint row counts, for the operator status view.
#[derive(Debug, Clone, Copy)]
pub struct SeenCounts {
    pub seen_items: i64,
    pub checkpoints: i64,
}

/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn count_seen(pool: &PgPool) -> Result<SeenCounts, DbError> {
    let seen_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_items")
        .fetch_one(pool)
        .await?;
    let checkpoints: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feed_checkpoints")
        .fetch_one(pool)
        .await?;
    Ok(SeenCounts {
        seen_items,
        checkpoints,
    })
}
