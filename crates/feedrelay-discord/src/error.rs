use thiserror::Error;

/// Errors returned by the Discord message sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination channel is permanently unusable (HTTP 403/404):
    /// deleted, or the bot lost access. Callers should queue the channel for
    /// cleanup instead of retrying.
    #[error("destination gone (HTTP {status})")]
    Gone { status: u16 },

    /// Discord returned HTTP 429. `retry_after_ms` is taken from the response
    /// body when present.
    #[error("rate limited by Discord")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Any other non-2xx response.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SinkError {
    /// Whether a retry after a short back-off could plausibly succeed.
    ///
    /// `Gone` never recovers; everything that looks like infrastructure
    /// trouble (timeout, connection failure, 5xx, 429) does.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SinkError::Gone { .. } => false,
            SinkError::RateLimited { .. } => true,
            SinkError::UnexpectedStatus { status, .. } => *status >= 500,
            SinkError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gone_is_not_transient() {
        assert!(!SinkError::Gone { status: 404 }.is_transient());
        assert!(!SinkError::Gone { status: 403 }.is_transient());
    }

    #[test]
    fn rate_limited_is_transient() {
        assert!(SinkError::RateLimited {
            retry_after_ms: Some(1200)
        }
        .is_transient());
    }

    #[test]
    fn server_errors_are_transient_but_client_errors_are_not() {
        assert!(SinkError::UnexpectedStatus {
            status: 502,
            body: String::new()
        }
        .is_transient());
        assert!(!SinkError::UnexpectedStatus {
            status: 400,
            body: String::new()
        }
        .is_transient());
    }
}
