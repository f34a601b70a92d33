//! Poll/dispatch loop for feedrelay.
//!
//! Each platform runs one recurring cycle: list the tracked accounts, fetch
//! each with staggered jitter, filter stale and already-seen items, mark the
//! survivors seen, then fan them out to every subscription's channel. The
//! supervisor owns the scheduler handle so the loops stop cleanly with the
//! process.

pub mod cycle;
pub mod dead;
pub mod pg;
pub mod render;
pub mod stores;
pub mod supervisor;

pub use cycle::{run_cycle, CycleConfig, CycleStats};
pub use dead::DeadChannelQueue;
pub use pg::{PgSeenStore, PgSubscriptionStore};
pub use stores::{SeenStore, StoreError, SubscriptionStore};
pub use supervisor::{build_supervisor, PollerDeps, Supervisor};
