//! HTTP client for the Discord REST API's message-send endpoint.
//!
//! The only capability the poller needs from Discord is "create message in
//! channel", so that is the whole surface here. Status handling maps the REST
//! error space onto [`SinkError`]'s taxonomy.

use std::time::Duration;

use serde::Deserialize;

use crate::error::SinkError;
use crate::message::{ChannelSink, MessageRef, OutboundMessage};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Client for the Discord REST API.
///
/// Use [`DiscordClient::new`] for production or
/// [`DiscordClient::with_base_url`] to point at a mock server in tests.
pub struct DiscordClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

/// Body of a 429 response; `retry_after` is in seconds.
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

impl DiscordClient {
    /// Creates a new client pointed at the production Discord API.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, user_agent: &str, timeout_secs: u64) -> Result<Self, SinkError> {
        Self::with_base_url(token, user_agent, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        user_agent: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ChannelSink for DiscordClient {
    async fn send(
        &self,
        channel_id: i64,
        message: &OutboundMessage,
    ) -> Result<MessageRef, SinkError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(message)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            403 | 404 => Err(SinkError::Gone {
                status: status.as_u16(),
            }),
            429 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let retry_after_ms = response
                    .json::<RateLimitBody>()
                    .await
                    .ok()
                    .map(|b| (b.retry_after * 1000.0) as u64);
                Err(SinkError::RateLimited { retry_after_ms })
            }
            _ if status.is_success() => {
                let message_ref = response.json::<MessageRef>().await?;
                Ok(message_ref)
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(SinkError::UnexpectedStatus {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                })
            }
        }
    }
}
