//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::CacheValue;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Field names on disk follow the snapshot format (`createAt`, `expireAt`).
/// Reading is lenient: a missing `createAt` is 0, timestamps may be
/// fractional, and a zero `expireAt` means no expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: CacheValue,
    /// Start of the current TTL window (Unix milliseconds)
    #[serde(rename = "createAt", default, deserialize_with = "lenient_timestamp")]
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    #[serde(rename = "expireAt", default, deserialize_with = "lenient_deadline")]
    pub expires_at: Option<u64>,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.map_or(0, round_ms))
}

fn lenient_deadline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|ms| *ms != 0.0)
        .map(round_ms))
}

/// Negative timestamps clamp to 0, which is already in the past.
fn round_ms(ms: f64) -> u64 {
    ms.round().max(0.0) as u64
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: CacheValue, created_at: u64, expires_at: Option<u64>) -> Self {
        Self {
            value,
            created_at,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` reaches its deadline. Entries without a
    /// deadline never expire.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Length of the TTL window this entry was written with.
    pub fn ttl_window_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(self.created_at))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
