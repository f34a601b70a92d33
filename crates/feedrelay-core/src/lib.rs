//! Shared configuration and domain types for feedrelay.
//!
//! Everything here is plain data: the config loader, the platform/account/
//! item/subscription types passed between the sources, the poller, and the
//! Discord sink, and the message template engine.

pub mod app_config;
pub mod config;
pub mod template;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use template::render_template;
pub use types::{FeedItem, Platform, Subscription, TrackedAccount};
