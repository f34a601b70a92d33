//! Retry with exponential back-off and jitter for channel sends.
//!
//! [`send_with_retry`] wraps one delivery and retries on transient errors
//! (timeouts, 5xx, 429). [`SinkError::Gone`] and other non-transient errors
//! are returned immediately so the caller can queue cleanup instead of
//! hammering a dead channel.

use std::time::Duration;

use crate::error::SinkError;
use crate::message::{ChannelSink, MessageRef, OutboundMessage};

const MAX_DELAY_MS: u64 = 30_000;

/// Send `message` with up to `max_retries` additional attempts on transient
/// errors.
///
/// Back-off doubles per attempt from `backoff_base_ms`, capped at 30 s, with
/// ±25% jitter. A 429 that carries `retry_after` sleeps that long instead.
///
/// # Errors
///
/// Returns the last [`SinkError`] once attempts are exhausted, or the first
/// non-transient error immediately.
pub async fn send_with_retry<S: ChannelSink + ?Sized>(
    sink: &S,
    channel_id: i64,
    message: &OutboundMessage,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Result<MessageRef, SinkError> {
    let mut attempt = 0u32;
    loop {
        match sink.send(channel_id, message).await {
            Ok(message_ref) => return Ok(message_ref),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = match err {
                    SinkError::RateLimited {
                        retry_after_ms: Some(ms),
                    } => ms.min(MAX_DELAY_MS),
                    _ => {
                        let computed =
                            backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                        let capped = computed.min(MAX_DELAY_MS);
                        #[allow(
                            clippy::cast_possible_truncation,
                            clippy::cast_sign_loss,
                            clippy::cast_precision_loss
                        )]
                        {
                            (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
                        }
                    }
                };
                tracing::warn!(
                    channel_id,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient send failure — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
