//! Live integration tests for feedrelay-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/feedrelay-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use feedrelay_core::{Platform, TrackedAccount};
use feedrelay_db::{
    count_seen, count_subscriptions_by_platform, delete_channels, filter_seen, get_checkpoint,
    insert_subscription, is_seen, list_tracked_accounts, mark_seen, reset, set_checkpoint,
    subscriptions_for, NewSubscription,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_sub(guild_id: i64, channel_id: i64, platform: Platform, account_id: &str) -> NewSubscription<'_> {
    NewSubscription {
        guild_id,
        channel_id,
        platform,
        account_id,
        account_name: account_id,
        board: None,
        board_id: None,
        embeds: true,
        only_new: true,
        shorts: true,
        template: None,
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Subscription registry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn tracked_accounts_are_distinct_per_polling_unit(pool: sqlx::PgPool) {
    // Three guilds follow the same account; one of them scopes it to a board.
    let mut sub = new_sub(1, 101, Platform::Pinterest, "user1");
    insert_subscription(&pool, &sub).await.unwrap();

    sub = new_sub(2, 202, Platform::Pinterest, "user1");
    insert_subscription(&pool, &sub).await.unwrap();

    sub = new_sub(3, 303, Platform::Pinterest, "user1");
    sub.board = Some("art");
    sub.board_id = Some("board9");
    insert_subscription(&pool, &sub).await.unwrap();

    let accounts = list_tracked_accounts(&pool, Platform::Pinterest)
        .await
        .unwrap();

    // Whole-profile unit and board-scoped unit, not three rows.
    assert_eq!(accounts.len(), 2);
    assert!(accounts
        .iter()
        .any(|a| a.external_id == "user1" && a.scope.is_none()));
    assert!(accounts
        .iter()
        .any(|a| a.external_id == "user1" && a.scope.as_deref() == Some("board9")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn subscriptions_for_matches_scope(pool: sqlx::PgPool) {
    let mut sub = new_sub(1, 101, Platform::Pinterest, "user1");
    insert_subscription(&pool, &sub).await.unwrap();

    sub = new_sub(2, 202, Platform::Pinterest, "user1");
    sub.board_id = Some("board9");
    insert_subscription(&pool, &sub).await.unwrap();

    let whole = TrackedAccount::new(Platform::Pinterest, "user1");
    let subs = subscriptions_for(&pool, &whole).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].channel_id, 101);

    let scoped = TrackedAccount {
        scope: Some("board9".to_string()),
        ..whole
    };
    let subs = subscriptions_for(&pool, &scoped).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].channel_id, 202);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reinserting_moves_the_subscription(pool: sqlx::PgPool) {
    let mut sub = new_sub(1, 101, Platform::Youtube, "UCabc");
    insert_subscription(&pool, &sub).await.unwrap();

    sub.channel_id = 999;
    sub.shorts = false;
    insert_subscription(&pool, &sub).await.unwrap();

    let account = TrackedAccount::new(Platform::Youtube, "UCabc");
    let subs = subscriptions_for(&pool, &account).await.unwrap();
    assert_eq!(subs.len(), 1, "conflict key must collapse to one row");
    assert_eq!(subs[0].channel_id, 999);
    assert!(!subs[0].shorts);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_channels_is_batched(pool: sqlx::PgPool) {
    insert_subscription(&pool, &new_sub(1, 101, Platform::Twitter, "a"))
        .await
        .unwrap();
    insert_subscription(&pool, &new_sub(1, 102, Platform::Twitter, "b"))
        .await
        .unwrap();
    insert_subscription(&pool, &new_sub(1, 103, Platform::Twitter, "c"))
        .await
        .unwrap();

    let deleted = delete_channels(&pool, &[101, 103]).await.unwrap();
    assert_eq!(deleted, 2);

    let counts = count_subscriptions_by_platform(&pool).await.unwrap();
    assert_eq!(counts, vec![("twitter".to_string(), 1)]);

    // Empty batch is a no-op, not a query error.
    assert_eq!(delete_channels(&pool, &[]).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Dedup store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn mark_seen_then_filter_seen(pool: sqlx::PgPool) {
    let key = TrackedAccount::new(Platform::Youtube, "UCabc").dedup_key();

    mark_seen(&pool, &key, &ids(&["v1", "v2"])).await.unwrap();
    // Idempotent re-mark.
    mark_seen(&pool, &key, &ids(&["v2", "v3"])).await.unwrap();

    let seen = filter_seen(&pool, &key, &ids(&["v1", "v2", "v3", "v4"]))
        .await
        .unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen.contains("v1") && seen.contains("v2") && seen.contains("v3"));
    assert!(!seen.contains("v4"));

    assert!(is_seen(&pool, &key, "v1").await.unwrap());
    assert!(!is_seen(&pool, &key, "v4").await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn seen_sets_are_independent_per_key(pool: sqlx::PgPool) {
    // Same item id string under two platforms.
    let yt = TrackedAccount::new(Platform::Youtube, "shared").dedup_key();
    let tw = TrackedAccount::new(Platform::Twitter, "shared").dedup_key();

    mark_seen(&pool, &yt, &ids(&["item1"])).await.unwrap();

    assert!(is_seen(&pool, &yt, "item1").await.unwrap());
    assert!(!is_seen(&pool, &tw, "item1").await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn checkpoint_upsert_and_fetch(pool: sqlx::PgPool) {
    let key = TrackedAccount::new(Platform::Pinterest, "user1").dedup_key();

    assert_eq!(get_checkpoint(&pool, &key).await.unwrap(), None);

    set_checkpoint(&pool, &key, "cp1").await.unwrap();
    assert_eq!(
        get_checkpoint(&pool, &key).await.unwrap().as_deref(),
        Some("cp1")
    );

    set_checkpoint(&pool, &key, "cp2").await.unwrap();
    assert_eq!(
        get_checkpoint(&pool, &key).await.unwrap().as_deref(),
        Some("cp2")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn reset_clears_seen_set_and_checkpoint(pool: sqlx::PgPool) {
    let key = TrackedAccount::new(Platform::Pinterest, "user1").dedup_key();
    let other = TrackedAccount::new(Platform::Pinterest, "user2").dedup_key();

    mark_seen(&pool, &key, &ids(&["p1", "p2"])).await.unwrap();
    set_checkpoint(&pool, &key, "cp7").await.unwrap();
    mark_seen(&pool, &other, &ids(&["p9"])).await.unwrap();

    reset(&pool, &key).await.unwrap();

    assert!(!is_seen(&pool, &key, "p1").await.unwrap());
    assert_eq!(get_checkpoint(&pool, &key).await.unwrap(), None);
    // Other keys are untouched.
    assert!(is_seen(&pool, &other, "p9").await.unwrap());

    let counts = count_seen(&pool).await.unwrap();
    assert_eq!(counts.seen_items, 1);
    assert_eq!(counts.checkpoints, 0);
}
