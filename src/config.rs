//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::persistence::SNAPSHOT_FILE;
use crate::duration::{parse_duration_ms, Ttl};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshot file path
    pub cache_file: PathBuf,
    /// Whether snapshots are read and written at all
    pub persistence_enabled: bool,
    /// Interval between full expiry sweeps
    pub sweep_interval: Duration,
    /// Interval between periodic snapshots
    pub persist_interval: Duration,
    /// TTLs longer than this log a warning
    pub max_recommended_ttl: Duration,
    /// Keys with this prefix never trigger the long-TTL warning
    pub ttl_exempt_prefix: String,
    /// Lifetime of issued JWTs, sets the login token TTL
    pub jwt_ttl: Ttl,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_FILE` - Snapshot path (default: cache.json)
    /// - `CACHE_PERSISTENCE` - Enable snapshots (default: true)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep interval (default: 30m)
    /// - `CACHE_PERSIST_INTERVAL` - Periodic persist interval (default: 1h)
    /// - `CACHE_MAX_RECOMMENDED_TTL` - Long-TTL warning threshold (default: 1d)
    /// - `CACHE_TTL_EXEMPT_PREFIX` - Prefix exempt from the warning (default: AUTH::)
    /// - `JWT_TTL` - JWT lifetime (default: 7d)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_file: env::var("CACHE_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_file),
            persistence_enabled: env::var("CACHE_PERSISTENCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.persistence_enabled),
            sweep_interval: env_duration("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.sweep_interval),
            persist_interval: env_duration("CACHE_PERSIST_INTERVAL")
                .unwrap_or(defaults.persist_interval),
            max_recommended_ttl: env_duration("CACHE_MAX_RECOMMENDED_TTL")
                .unwrap_or(defaults.max_recommended_ttl),
            ttl_exempt_prefix: env::var("CACHE_TTL_EXEMPT_PREFIX")
                .unwrap_or(defaults.ttl_exempt_prefix),
            jwt_ttl: env::var("JWT_TTL")
                .ok()
                .filter(|v| parse_duration_ms(v).is_ok_and(|ms| ms > 0))
                .map(Ttl::from)
                .unwrap_or(defaults.jwt_ttl),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Snapshot path when persistence is enabled.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.persistence_enabled.then(|| self.cache_file.clone())
    }
}

/// Positive duration from an environment variable, None if unset or invalid.
fn env_duration(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| parse_duration_ms(&v).ok())
        .and_then(|ms| u64::try_from(ms).ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(SNAPSHOT_FILE),
            persistence_enabled: true,
            sweep_interval: Duration::from_secs(30 * 60),
            persist_interval: Duration::from_secs(60 * 60),
            max_recommended_ttl: Duration::from_secs(24 * 60 * 60),
            ttl_exempt_prefix: "AUTH::".to_string(),
            jwt_ttl: Ttl::from("7d"),
            server_port: 3000,
        }
    }
}
