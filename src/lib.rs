//! Webapp Cache - the in-process key-value cache of the web application
//!
//! Provides per-key TTL expiry, periodic sweeping, JSON snapshot persistence
//! and hydrating updates behind a cloneable async handle.

pub mod api;
pub mod cache;
pub mod config;
pub mod consumers;
pub mod duration;
pub mod error;
pub mod facade;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheInfo, CacheValue, HydrateMode, KeyTtl, RenewTtl, UpdateOptions, UpdateOutcome};
pub use config::Config;
pub use duration::{parse_duration_ms, Ttl};
pub use error::{CacheError, Result};
pub use facade::Cache;
