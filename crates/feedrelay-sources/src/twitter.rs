//! Twitter/X user timeline via the v2 API.
//!
//! Uses app-only bearer auth. The checkpoint is the `since_id` watermark:
//! the newest tweet id from the previous fetch, so each cycle only pays for
//! tweets it has not considered yet. `meta.result_count == 0` is the
//! "nothing new" signal.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use feedrelay_core::{FeedItem, Platform, TrackedAccount};

use crate::error::SourceError;
use crate::types::{FeedSource, FetchResult};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

// The v2 timeline endpoint rejects max_results outside 5..=100.
const MIN_RESULTS: usize = 5;
const MAX_RESULTS: usize = 100;

pub struct TwitterSource {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Option<Includes>,
    meta: TimelineMeta,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: String,
    author_id: String,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<TwitterUser>,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct TimelineMeta {
    result_count: u32,
    newest_id: Option<String>,
}

impl TwitterSource {
    /// Creates an adapter pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        bearer_token: &str,
        user_agent: &str,
        timeout_secs: u64,
        limit: usize,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(bearer_token, user_agent, timeout_secs, limit, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        bearer_token: &str,
        user_agent: &str,
        timeout_secs: u64,
        limit: usize,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
            limit: limit.clamp(MIN_RESULTS, MAX_RESULTS),
        })
    }
}

#[async_trait]
impl FeedSource for TwitterSource {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn fetch(
        &self,
        account: &TrackedAccount,
        checkpoint: Option<&str>,
    ) -> Result<FetchResult, SourceError> {
        let url = format!("{}/2/users/{}/tweets", self.base_url, account.external_id);

        let limit = self.limit.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("max_results", limit.as_str()),
            ("exclude", "replies,retweets"),
            ("tweet.fields", "created_at,author_id"),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ];
        if let Some(since_id) = checkpoint {
            query.push(("since_id", since_id));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let timeline: TimelineResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: format!("timeline for {}", account.external_id),
                source: e,
            })?;

        tracing::debug!(
            user = %account.external_id,
            count = timeline.meta.result_count,
            "fetched timeline"
        );

        if timeline.meta.result_count == 0 || timeline.data.is_empty() {
            return Ok(FetchResult::Empty);
        }

        let users = timeline.includes.map(|i| i.users).unwrap_or_default();
        let items = timeline
            .data
            .into_iter()
            .filter_map(|tweet| tweet_to_item(tweet, &users, &account.display_name))
            .collect();

        Ok(FetchResult::Items {
            items,
            checkpoint: timeline.meta.newest_id,
        })
    }
}

/// Convert a raw tweet to a feed item; tweets with unparseable timestamps are
/// dropped rather than failing the page.
fn tweet_to_item(tweet: Tweet, users: &[TwitterUser], fallback_author: &str) -> Option<FeedItem> {
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&tweet.created_at)
        .ok()?
        .with_timezone(&Utc);

    let username = users
        .iter()
        .find(|u| u.id == tweet.author_id)
        .map_or(fallback_author, |u| u.username.as_str());

    Some(FeedItem {
        url: format!("https://x.com/{username}/status/{}", tweet.id),
        title: tweet.text,
        author: username.to_string(),
        image_url: None,
        created_at,
        is_short: false,
        id: tweet.id,
    })
}
