use thiserror::Error;

/// Errors returned by platform source adapters.
///
/// Every variant means "platform unreachable or unusable right now"; the
/// poller skips the account for the cycle and tries again next interval.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed XML in an Atom/RSS feed body.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// RSS parse failure from the feed parser.
    #[error("feed parse error: {0}")]
    Feed(String),

    /// The platform returned HTTP 429.
    #[error("rate limited by the platform")]
    RateLimited,

    /// Any other non-2xx response.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },
}
