//! Discord REST message sink.
//!
//! Wraps `reqwest` with Discord-specific error classification: a 403/404 from
//! a channel send means the destination is permanently gone (the poller
//! queues it for cleanup), while timeouts, 5xx, and 429 are transient and
//! worth a bounded retry.

pub mod client;
pub mod error;
pub mod message;
pub mod retry;

pub use client::DiscordClient;
pub use error::SinkError;
pub use message::{ChannelSink, Embed, EmbedAuthor, EmbedFooter, EmbedImage, MessageRef, OutboundMessage};
pub use retry::send_with_retry;
