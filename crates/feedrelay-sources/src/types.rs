use async_trait::async_trait;

use feedrelay_core::{FeedItem, Platform, TrackedAccount};

use crate::error::SourceError;

/// Outcome of one fetch for one tracked account.
#[derive(Debug)]
pub enum FetchResult {
    /// At least one item found. `checkpoint` is the cursor to resume from
    /// next cycle, absent on platforms without pagination.
    Items {
        items: Vec<FeedItem>,
        checkpoint: Option<String>,
    },
    /// Platform reachable, zero new items.
    Empty,
}

/// Capability to fetch new items for tracked accounts on one platform.
///
/// Implementations hold only an HTTP client and endpoint configuration;
/// item ordering within a result is unspecified and the caller must dedup
/// as a set.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch the newest batch of items for `account`, resuming from
    /// `checkpoint` where the platform supports it.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the platform is unreachable, rate
    /// limiting, or returning malformed data. The caller must not mutate any
    /// dedup state on an error.
    async fn fetch(
        &self,
        account: &TrackedAccount,
        checkpoint: Option<&str>,
    ) -> Result<FetchResult, SourceError>;
}
