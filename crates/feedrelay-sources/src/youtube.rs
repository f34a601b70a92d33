//! YouTube channel uploads via the public Atom feed.
//!
//! `https://www.youtube.com/feeds/videos.xml?channel_id=...` carries the
//! channel's most recent uploads with no auth and no pagination cursor, so
//! this adapter never returns a checkpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;

use feedrelay_core::{FeedItem, Platform, TrackedAccount};

use crate::error::SourceError;
use crate::types::{FeedSource, FetchResult};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

pub struct YoutubeSource {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

impl YoutubeSource {
    /// Creates an adapter pointed at the production feed endpoint.
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
impl FeedSource for YoutubeSource {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn fetch(
        &self,
        account: &TrackedAccount,
        _checkpoint: Option<&str>,
    ) -> Result<FetchResult, SourceError> {
        let channel_id = utf8_percent_encode(&account.external_id, NON_ALPHANUMERIC);
        let url = format!("{}/feeds/videos.xml?channel_id={channel_id}", self.base_url);

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
        let mut items = parse_uploads_feed(&body)?;
        items.truncate(self.limit);
        tracing::debug!(
            channel = %account.external_id,
            count = items.len(),
            "fetched uploads feed"
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

/// Parse the uploads Atom feed into feed items.
///
/// Entries without a video id, link, or parseable timestamp are skipped
/// rather than failing the whole feed.
fn parse_uploads_feed(xml: &str) -> Result<Vec<FeedItem>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_entry = false;
    let mut current_tag = String::new();
    let mut video_id = String::new();
    let mut title = String::new();
    let mut author = String::new();
    let mut video_url = String::new();
    let mut image_url = None;
    let mut published = None;
    let mut items = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("");
                match name {
                    "entry" => {
                        in_entry = true;
                        video_id.clear();
                        title.clear();
                        author.clear();
                        video_url.clear();
                        image_url = None;
                        published = None;
                    }
                    "link" if in_entry => {
                        if let Some(href) = link_href(&e) {
                            video_url = href;
                        }
                    }
                    _ => {
                        current_tag = name.to_string();
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if in_entry {
                    let name_buf = e.name().as_ref().to_vec();
                    let name = std::str::from_utf8(&name_buf).unwrap_or("");
                    match name {
                        "link" => {
                            if let Some(href) = link_href(&e) {
                                video_url = href;
                            }
                        }
                        "media:thumbnail" => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"url" {
                                    image_url = Some(
                                        String::from_utf8_lossy(attr.value.as_ref()).to_string(),
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_entry {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    match current_tag.as_str() {
                        "yt:videoId" => video_id = text,
                        "title" => title = text,
                        "name" => author = text,
                        "published" => {
                            published = DateTime::parse_from_rfc3339(&text)
                                .ok()
                                .map(|dt| dt.with_timezone(&Utc));
                        }
                        _ => {}
                    }
                    current_tag.clear();
                }
            }
            Ok(Event::End(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("");
                if name == "entry" {
                    in_entry = false;
                    if let Some(created_at) = published {
                        if !video_id.is_empty() && !video_url.is_empty() {
                            let is_short = video_url.contains("/shorts/")
                                || title.to_lowercase().contains("#shorts");
                            items.push(FeedItem {
                                id: video_id.clone(),
                                created_at,
                                title: title.clone(),
                                url: video_url.clone(),
                                author: author.clone(),
                                image_url: image_url.clone(),
                                is_short,
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn link_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let mut rel_alternate = false;
    let mut href = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"rel" => rel_alternate = attr.value.as_ref() == b"alternate",
            b"href" => href = Some(String::from_utf8_lossy(attr.value.as_ref()).to_string()),
            _ => {}
        }
    }
    if rel_alternate {
        href
    } else {
        // Entries carry exactly one link; tolerate feeds without rel.
        href.filter(|h| h.contains("/watch") || h.contains("/shorts/"))
    }
}

#[cfg(test)]
mod tests {
    use super::parse_uploads_feed;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Uploads</title>
  <entry>
    <id>yt:video:v1</id>
    <yt:videoId>v1</yt:videoId>
    <title>Release day vlog</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=v1"/>
    <author><name>Some Creator</name></author>
    <published>2025-08-01T12:00:00+00:00</published>
    <media:group>
      <media:thumbnail url="https://i.ytimg.com/vi/v1/hqdefault.jpg" width="480" height="360"/>
    </media:group>
  </entry>
  <entry>
    <id>yt:video:v2</id>
    <yt:videoId>v2</yt:videoId>
    <title>Quick one #shorts</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=v2"/>
    <author><name>Some Creator</name></author>
    <published>2025-08-02T08:30:00+00:00</published>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_into_items() {
        let items = parse_uploads_feed(FEED).expect("parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "v1");
        assert_eq!(items[0].title, "Release day vlog");
        assert_eq!(items[0].author, "Some Creator");
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://i.ytimg.com/vi/v1/hqdefault.jpg")
        );
        assert!(!items[0].is_short);
    }

    #[test]
    fn flags_shorts_by_title_marker() {
        let items = parse_uploads_feed(FEED).expect("parse");
        assert!(items[1].is_short);
        assert!(items[1].image_url.is_none());
    }

    #[test]
    fn empty_feed_yields_no_items() {
        let xml = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"><title>Uploads</title></feed>"#;
        assert!(parse_uploads_feed(xml).expect("parse").is_empty());
    }

    #[test]
    fn entry_without_published_is_skipped() {
        let xml = r#"<feed xmlns:yt="x"><entry><yt:videoId>v9</yt:videoId>
<link rel="alternate" href="https://www.youtube.com/watch?v=v9"/>
<title>No timestamp</title></entry></feed>"#;
        assert!(parse_uploads_feed(xml).expect("parse").is_empty());
    }
}
