//! Cache Module
//!
//! Provides in-memory caching with per-key TTL timers, sweeping, hydrate
//! updates and snapshot persistence.

mod clock;
mod entry;
mod hydrate;
mod info;
mod options;
pub mod persistence;
mod store;
mod timers;
mod value;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use hydrate::{hydrate, HydrateMode};
pub use info::CacheInfo;
pub use options::{KeyTtl, RenewTtl, UpdateOptions, UpdateOutcome};
pub use store::{CacheStore, LoadReport, StoreOptions};
pub use timers::{TimerHandle, TimerQueue};
pub use value::{CacheValue, ObjectMap};
