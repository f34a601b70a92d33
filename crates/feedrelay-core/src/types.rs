//! Domain types shared by the sources, the poller, and the sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// External platform a tracked account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Pinterest,
    Twitter,
    Youtube,
    Soundcloud,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Pinterest,
        Platform::Twitter,
        Platform::Youtube,
        Platform::Soundcloud,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Pinterest => "pinterest",
            Platform::Twitter => "twitter",
            Platform::Youtube => "youtube",
            Platform::Soundcloud => "soundcloud",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pinterest" => Ok(Platform::Pinterest),
            "twitter" => Ok(Platform::Twitter),
            "youtube" => Ok(Platform::Youtube),
            "soundcloud" => Ok(Platform::Soundcloud),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// One external account being polled, derived by grouping subscriptions.
///
/// `(platform, external_id, scope)` identifies a polling unit: the poller
/// fetches each tracked account at most once per cycle no matter how many
/// subscriptions reference it. `scope` narrows the account to a sub-feed
/// (currently only a Pinterest board id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedAccount {
    pub platform: Platform,
    pub external_id: String,
    pub display_name: String,
    pub scope: Option<String>,
}

impl TrackedAccount {
    #[must_use]
    pub fn new(platform: Platform, external_id: impl Into<String>) -> Self {
        let external_id = external_id.into();
        Self {
            platform,
            display_name: external_id.clone(),
            external_id,
            scope: None,
        }
    }

    /// Namespaced dedup-state key for this polling unit.
    ///
    /// Item ids are only unique per platform, and two scopes of the same
    /// account ("all pins" vs "pins from board X") keep independent seen-sets,
    /// so the key covers platform, account id, and scope. The id/scope part is
    /// hashed to keep keys flat regardless of what platforms put in their ids.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.external_id.as_bytes());
        hasher.update(b"\n");
        if let Some(scope) = &self.scope {
            hasher.update(scope.as_bytes());
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        format!("{}:{hex}", self.platform)
    }
}

/// One unit of new content returned by a platform fetch.
///
/// Ephemeral: rendered and possibly recorded as seen (by id), never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    /// Platform-native stable id, unique per (platform, account).
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub author: String,
    pub image_url: Option<String>,
    /// YouTube Shorts marker; always false on other platforms.
    pub is_short: bool,
}

/// A destination channel's interest in a tracked account, with per-destination
/// delivery options. Read-only from the poller's perspective.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub guild_id: i64,
    pub channel_id: i64,
    pub platform: Platform,
    pub account_id: String,
    pub account_name: String,
    pub board: Option<String>,
    pub board_id: Option<String>,
    /// Embed rendering on/off; off means plain messages in small batches.
    pub embeds: bool,
    /// Only announce items newer than the subscription itself.
    pub only_new: bool,
    /// Include YouTube Shorts.
    pub shorts: bool,
    pub template: Option<String>,
    pub created_at: DateTime<Utc>,
}
