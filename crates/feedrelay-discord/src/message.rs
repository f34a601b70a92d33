//! Outgoing message shapes and the sink capability trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// One message ready to send to a channel: plain content, embeds, or both.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl OutboundMessage {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    #[must_use]
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

/// Subset of the Discord embed object the renderer uses.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

/// Handle to a message the sink accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub channel_id: String,
}

/// Capability to deliver a rendered message to a destination channel.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SinkError::Gone`] when the destination no longer exists or
    /// is no longer writable, and transient variants for everything worth
    /// retrying.
    async fn send(
        &self,
        channel_id: i64,
        message: &OutboundMessage,
    ) -> Result<MessageRef, SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_serializes_without_embed_key() {
        let msg = OutboundMessage::text("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hello" }));
    }

    #[test]
    fn embed_serializes_only_set_fields() {
        let msg = OutboundMessage::embed(Embed {
            title: Some("new video".to_string()),
            url: Some("https://youtu.be/v1".to_string()),
            color: Some(0x00FF_0000),
            ..Embed::default()
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "embeds": [{
                    "title": "new video",
                    "url": "https://youtu.be/v1",
                    "color": 0x00FF_0000
                }]
            })
        );
    }
}
