//! SoundCloud user tracks via the public RSS feed.
//!
//! `https://feeds.soundcloud.com/users/soundcloud:users:{id}/sounds.rss`
//! carries the user's most recent tracks; no auth, no pagination cursor.

use std::time::Duration;

use async_trait::async_trait;

use feedrelay_core::{FeedItem, Platform, TrackedAccount};

use crate::error::SourceError;
use crate::types::{FeedSource, FetchResult};

const DEFAULT_BASE_URL: &str = "https://feeds.soundcloud.com";

pub struct SoundcloudSource {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

impl SoundcloudSource {
    /// Creates an adapter pointed at the production feed host.
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
impl FeedSource for SoundcloudSource {
    fn platform(&self) -> Platform {
        Platform::Soundcloud
    }

    async fn fetch(
        &self,
        account: &TrackedAccount,
        _checkpoint: Option<&str>,
    ) -> Result<FetchResult, SourceError> {
        let url = format!(
            "{}/users/soundcloud:users:{}/sounds.rss",
            self.base_url, account.external_id
        );

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

        let body = response.bytes().await?;
        let mut items = parse_tracks_feed(&body, &account.display_name)?;
        items.truncate(self.limit);
        tracing::debug!(
            user = %account.external_id,
            count = items.len(),
            "fetched track feed"
        );

        if items.is_empty() {
            Ok(FetchResult::Empty)
        } else {
            Ok(FetchResult::Items {
                items,
                checkpoint: None,
            })
        }
    }
}

/// Parse the track RSS into feed items.
///
/// Entries without a guid, link, or timestamp are skipped rather than failing
/// the whole feed.
fn parse_tracks_feed(body: &[u8], fallback_author: &str) -> Result<Vec<FeedItem>, SourceError> {
    let feed = feed_rs::parser::parse(body).map_err(|e| SourceError::Feed(e.to_string()))?;

    let channel_author = feed
        .title
        .map(|t| t.content)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_author.to_string());

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let created_at = entry.published?;
            let url = entry.links.first().map(|l| l.href.clone())?;
            if entry.id.is_empty() {
                return None;
            }
            let author = entry
                .authors
                .first()
                .map(|a| a.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| channel_author.clone());
            let image_url = entry
                .media
                .first()
                .and_then(|m| m.thumbnails.first())
                .map(|t| t.image.uri.clone());
            Some(FeedItem {
                id: entry.id,
                created_at,
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                url,
                author,
                image_url,
                is_short: false,
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::parse_tracks_feed;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>nightdrive</title>
    <item>
      <guid isPermaLink="false">tag:soundcloud,2010:tracks/2134567</guid>
      <title>late night loop</title>
      <link>https://soundcloud.com/nightdrive/late-night-loop</link>
      <pubDate>Fri, 01 Aug 2025 22:15:00 +0000</pubDate>
    </item>
    <item>
      <guid isPermaLink="false">tag:soundcloud,2010:tracks/2134568</guid>
      <title>no date, skipped</title>
      <link>https://soundcloud.com/nightdrive/skipped</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_tracks_and_skips_undated_entries() {
        let items = parse_tracks_feed(FEED.as_bytes(), "fallback").expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "tag:soundcloud,2010:tracks/2134567");
        assert_eq!(items[0].title, "late night loop");
        assert_eq!(
            items[0].url,
            "https://soundcloud.com/nightdrive/late-night-loop"
        );
        assert_eq!(items[0].author, "nightdrive");
    }

    #[test]
    fn invalid_feed_is_an_error() {
        assert!(parse_tracks_feed(b"not xml at all", "fallback").is_err());
    }
}
