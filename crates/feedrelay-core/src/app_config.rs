/// Runtime configuration for the daemon and CLI, loaded from the environment.
///
/// Poll intervals, the staleness window, jitter bounds, and retry counts are
/// all configurable because the right values differ per platform deployment;
/// the defaults in [`crate::config`] are the ones used in production.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub discord_token: String,
    pub twitter_bearer_token: Option<String>,
    pub user_agent: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub send_timeout_secs: u64,
    pub staleness_secs: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub delivery_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub fetch_limit: usize,
    pub plain_batch_size: usize,
    pub pinterest_interval_secs: u64,
    pub twitter_interval_secs: u64,
    pub youtube_interval_secs: u64,
    pub soundcloud_interval_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("discord_token", &"[redacted]")
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("user_agent", &self.user_agent)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .field("staleness_secs", &self.staleness_secs)
            .field("jitter_min_ms", &self.jitter_min_ms)
            .field("jitter_max_ms", &self.jitter_max_ms)
            .field("delivery_retries", &self.delivery_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("fetch_limit", &self.fetch_limit)
            .field("plain_batch_size", &self.plain_batch_size)
            .field("pinterest_interval_secs", &self.pinterest_interval_secs)
            .field("twitter_interval_secs", &self.twitter_interval_secs)
            .field("youtube_interval_secs", &self.youtube_interval_secs)
            .field("soundcloud_interval_secs", &self.soundcloud_interval_secs)
            .finish()
    }
}
