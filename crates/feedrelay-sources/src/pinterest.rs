//! Pinterest saved-pin feed via the v3 pin feed endpoint.
//!
//! The endpoint paginates with an opaque `bookmark` cursor: each page returns
//! the cursor for the next one, and an exhausted feed comes back with zero
//! pins, which the poller uses as its reset-on-drain signal.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use feedrelay_core::{FeedItem, Platform, TrackedAccount};

use crate::error::SourceError;
use crate::types::{FeedSource, FetchResult};

const DEFAULT_BASE_URL: &str = "https://api.pinterest.com";

/// Sentinel bookmark Pinterest returns when pagination is exhausted.
const BOOKMARK_END: &str = "-end-";

pub struct PinterestSource {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct PinFeedResponse {
    #[serde(default)]
    data: Vec<Pin>,
    bookmark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Pin {
    id: String,
    #[serde(default)]
    description: Option<String>,
    created_at: String,
    #[serde(default)]
    images: Option<PinImages>,
    #[serde(default)]
    pinner: Option<Pinner>,
    #[serde(default)]
    board: Option<PinBoard>,
}

#[derive(Debug, Deserialize)]
struct PinImages {
    orig: Option<PinImage>,
}

#[derive(Debug, Deserialize)]
struct PinImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Pinner {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinBoard {
    id: String,
}

impl PinterestSource {
    /// Creates an adapter pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str, timeout_secs: u64, limit: usize) -> Result<Self, SourceError> {
        Self::with_base_url(user_agent, timeout_secs, limit, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
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
            limit,
        })
    }
}

#[async_trait]
impl FeedSource for PinterestSource {
    fn platform(&self) -> Platform {
        Platform::Pinterest
    }

    async fn fetch(
        &self,
        account: &TrackedAccount,
        checkpoint: Option<&str>,
    ) -> Result<FetchResult, SourceError> {
        let user_id = utf8_percent_encode(&account.external_id, NON_ALPHANUMERIC);
        let mut url = format!(
            "{}/v3/users/{user_id}/pins/feed/?page_size={}",
            self.base_url, self.limit
        );
        if let Some(bookmark) = checkpoint {
            let bookmark = utf8_percent_encode(bookmark, NON_ALPHANUMERIC);
            url.push_str(&format!("&bookmark={bookmark}"));
        }

        let response = self.client.get(url).send().await?;
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
        let feed: PinFeedResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: format!("pin feed for {}", account.external_id),
                source: e,
            })?;

        let items: Vec<FeedItem> = feed
            .data
            .into_iter()
            .filter(|pin| match (&account.scope, &pin.board) {
                // Board-scoped subscriptions only see pins saved to that board.
                (Some(board_id), Some(board)) => board.id == *board_id,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter_map(|pin| pin_to_item(pin, &account.display_name))
            .collect();

        tracing::debug!(
            user = %account.external_id,
            count = items.len(),
            "fetched pin feed page"
        );

        if items.is_empty() {
            return Ok(FetchResult::Empty);
        }

        let checkpoint = feed.bookmark.filter(|b| b != BOOKMARK_END);
        Ok(FetchResult::Items { items, checkpoint })
    }
}

/// Convert a raw pin to a feed item; pins with unparseable timestamps are
/// dropped rather than failing the page.
fn pin_to_item(pin: Pin, fallback_author: &str) -> Option<FeedItem> {
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc2822(&pin.created_at)
        .ok()?
        .with_timezone(&Utc);

    let author = pin
        .pinner
        .and_then(|p| p.full_name.filter(|n| !n.is_empty()).or(p.username))
        .unwrap_or_else(|| fallback_author.to_string());

    let url = format!("https://www.pinterest.com/pin/{}/", pin.id);
    Some(FeedItem {
        title: pin.description.unwrap_or_default().trim().to_string(),
        url,
        author,
        image_url: pin.images.and_then(|i| i.orig).map(|i| i.url),
        created_at,
        is_short: false,
        id: pin.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN_JSON: &str = r#"{
        "id": "991234",
        "description": "mood board",
        "created_at": "Fri, 01 Aug 2025 12:00:00 +0000",
        "images": { "orig": { "url": "https://i.pinimg.com/originals/99.jpg" } },
        "pinner": { "username": "prettybiglies", "full_name": "Pretty Big Lies" },
        "board": { "id": "board9" }
    }"#;

    #[test]
    fn deserialize_pin() {
        let pin: Pin = serde_json::from_str(PIN_JSON).unwrap();
        assert_eq!(pin.id, "991234");
        assert_eq!(pin.board.as_ref().map(|b| b.id.as_str()), Some("board9"));
    }

    #[test]
    fn pin_to_item_builds_canonical_url() {
        let pin: Pin = serde_json::from_str(PIN_JSON).unwrap();
        let item = pin_to_item(pin, "fallback").expect("item");
        assert_eq!(item.url, "https://www.pinterest.com/pin/991234/");
        assert_eq!(item.author, "Pretty Big Lies");
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://i.pinimg.com/originals/99.jpg")
        );
    }

    #[test]
    fn pin_with_bad_timestamp_is_dropped() {
        let pin: Pin = serde_json::from_str(
            r#"{ "id": "1", "created_at": "not-a-date" }"#,
        )
        .unwrap();
        assert!(pin_to_item(pin, "fallback").is_none());
    }

    #[test]
    fn missing_pinner_falls_back_to_account_name() {
        let pin: Pin = serde_json::from_str(
            r#"{ "id": "2", "created_at": "Fri, 01 Aug 2025 12:00:00 +0000" }"#,
        )
        .unwrap();
        let item = pin_to_item(pin, "tracked-name").expect("item");
        assert_eq!(item.author, "tracked-name");
    }
}
