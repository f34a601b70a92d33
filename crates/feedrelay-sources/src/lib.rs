//! Per-platform source adapters.
//!
//! Each adapter knows how to fetch the newest batch of items for one tracked
//! account on one platform, plus an updated pagination checkpoint where the
//! platform has one. Adapters are stateless between calls: the checkpoint is
//! supplied by the caller and returned alongside the items, never cached
//! internally. A failed fetch is the caller's signal to leave dedup state
//! untouched for that account this cycle.

pub mod error;
pub mod types;

mod pinterest;
mod soundcloud;
mod twitter;
mod youtube;

pub use error::SourceError;
pub use pinterest::PinterestSource;
pub use soundcloud::SoundcloudSource;
pub use twitter::TwitterSource;
pub use types::{FeedSource, FetchResult};
pub use youtube::YoutubeSource;
