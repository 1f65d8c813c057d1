//! Cache Store Module
//!
//! Main cache engine: entry map, per-key expiry timers, lazy expiration,
//! sweeping and snapshot persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};

use crate::cache::persistence::{read_snapshot, write_snapshot};
use crate::cache::{
    hydrate, CacheEntry, CacheInfo, CacheValue, Clock, KeyTtl, RenewTtl, SystemClock,
    TimerQueue, UpdateOptions, UpdateOutcome,
};
use crate::config::Config;
use crate::duration::Ttl;
use crate::error::Result;

/// Number of removed keys included in sweep logs.
const SWEEP_LOG_SAMPLE: usize = 10;

// == Store Options ==
/// Construction parameters for a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Snapshot file, None disables persistence
    pub snapshot_path: Option<PathBuf>,
    /// TTLs above this emit a warning
    pub max_recommended_ttl_ms: u64,
    /// Keys with this prefix are exempt from the long-TTL warning
    pub ttl_exempt_prefix: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            max_recommended_ttl_ms: 86_400_000,
            ttl_exempt_prefix: "AUTH::".to_string(),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            snapshot_path: config.snapshot_path(),
            max_recommended_ttl_ms: config.max_recommended_ttl.as_millis() as u64,
            ttl_exempt_prefix: config.ttl_exempt_prefix.clone(),
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }
}

/// Outcome of loading a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries re-admitted
    pub loaded: usize,
    /// Entries dropped because their deadline had passed
    pub expired: usize,
    /// Items that could not be decoded
    pub skipped: usize,
}

// == Cache Store ==
/// Key-value storage with per-key TTL timers.
///
/// Every key has at most one armed timer. Timers live in a deadline-ordered
/// queue; [`fire_due_timers`](Self::fire_due_timers) evicts the keys whose
/// deadline has been reached and a background driver calls it on time.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Armed expiry timers, never persisted
    timers: TimerQueue,
    /// Snapshot version written by the next persist
    version: u64,
    clock: Arc<dyn Clock>,
    /// Signalled whenever a timer is armed
    wakeup: Arc<Notify>,
    options: StoreOptions,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store on the wall clock.
    pub fn new(options: StoreOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: StoreOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            timers: TimerQueue::new(),
            version: 0,
            clock,
            wakeup: Arc::new(Notify::new()),
            options,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.options.snapshot_path.as_deref()
    }

    /// Notified each time a timer is armed, so a driver can re-plan its sleep.
    pub fn timer_wakeup(&self) -> Arc<Notify> {
        Arc::clone(&self.wakeup)
    }

    // == Set ==
    /// Stores a value, replacing any existing entry and its timer.
    ///
    /// `None` or a TTL resolving to zero stores a never-expiring entry.
    /// An invalid TTL expression is rejected before anything is written.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        ttl: Option<Ttl>,
    ) -> Result<()> {
        let key = key.into();
        let now = self.now_ms();
        let expires_at = deadline_for(ttl.as_ref(), now)?;

        self.timers.cancel(&key);
        self.entries
            .insert(key.clone(), CacheEntry::new(value.into(), now, expires_at));

        if let Some(deadline) = expires_at {
            if self.schedule(&key, deadline, now) {
                self.warn_long_ttl(&key, deadline - now);
            }
        }
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An entry found past its deadline is deleted and reported absent.
    pub fn get(&mut self, key: &str) -> Option<&CacheValue> {
        let now = self.now_ms();
        if self.entries.get(key)?.is_expired_at(now) {
            self.delete(key);
            trace!(key, "Lazily expired cache key");
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Update ==
    /// Updates an entry in place, optionally renewing its TTL and merging the
    /// new value into the old one.
    ///
    /// Only an invalid TTL expression is an error; a missing key is reported
    /// through [`UpdateOutcome`].
    pub fn update(
        &mut self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let key = key.into();
        let value = value.into();
        let now = self.now_ms();

        let Some(existing) = self.entries.get(&key) else {
            if !options.create_if_not_exists {
                return Ok(UpdateOutcome::Missing);
            }
            self.set(key, value, options.create_with_ttl)?;
            return Ok(UpdateOutcome::Created);
        };

        let old_expires_at = existing.expires_at;
        let new_expires_at = match &options.renew_ttl {
            RenewTtl::Keep => old_expires_at,
            // A deadline already in the past is left untouched; lazy
            // expiration or the sweep removes the entry.
            RenewTtl::Restart => match (old_expires_at, existing.ttl_window_ms()) {
                (Some(deadline), Some(window)) if deadline > now => Some(now + window),
                _ => old_expires_at,
            },
            RenewTtl::To(ttl) => deadline_for(Some(ttl), now)?,
        };
        let deadline_changed = new_expires_at != old_expires_at;
        let merged = options.hydrate && existing.value.is_plain_object() && value.is_plain_object();

        if let Some(entry) = self.entries.get_mut(&key) {
            let current = std::mem::take(&mut entry.value);
            entry.value = if options.hydrate {
                hydrate(current, value, options.hydrate_mode)
            } else {
                value
            };
            entry.expires_at = new_expires_at;
            if deadline_changed {
                entry.created_at = now;
            }
        }

        if deadline_changed {
            self.timers.cancel(&key);
            if let Some(deadline) = new_expires_at {
                self.schedule(&key, deadline, now);
            }
        }

        if merged {
            debug!(key = %key, mode = ?options.hydrate_mode, "Cache key hydrated");
        }
        Ok(UpdateOutcome::Updated)
    }

    // == Delete ==
    /// Removes an entry and its timer. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.timers.cancel(key);
        self.entries.remove(key).is_some()
    }

    /// Removes every entry and timer.
    pub fn clear(&mut self) {
        self.timers.cancel_all();
        self.entries.clear();
        debug!("Cache cleared");
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == TTL ==
    pub fn ttl(&self, key: &str) -> KeyTtl {
        let Some(entry) = self.entries.get(key) else {
            return KeyTtl::Missing;
        };
        match entry.ttl_remaining_ms(self.now_ms()) {
            None => KeyTtl::Never,
            Some(0) => KeyTtl::Missing,
            Some(remaining) => KeyTtl::Remaining(remaining),
        }
    }

    // == Timers ==
    /// Evicts every key whose timer deadline has been reached.
    ///
    /// Returns the number of entries removed.
    pub fn fire_due_timers(&mut self) -> usize {
        let now = self.now_ms();
        let mut fired = 0;
        for key in self.timers.pop_due(now) {
            if self.entries.remove(&key).is_some() {
                trace!(key = %key, "Cache key timer fired");
                fired += 1;
            }
        }
        fired
    }

    pub fn next_timer_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Number of armed timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the timer armed for `key`, if any.
    pub fn timer_deadline(&self, key: &str) -> Option<u64> {
        self.timers.handle(key).map(|handle| handle.deadline)
    }

    // == Sweep ==
    /// Removes all entries past their deadline, regardless of timers.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.now_ms();
        let total = self.entries.len();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in &expired_keys {
            if self.delete(key) {
                removed += 1;
            }
        }

        if removed > 0 {
            let sample = &expired_keys[..expired_keys.len().min(SWEEP_LOG_SAMPLE)];
            debug!(removed, total, keys = ?sample, "Cache sweep removed expired entries");
        }
        removed
    }

    // == Info ==
    pub fn info(&self) -> CacheInfo {
        CacheInfo::collect(self.entries.values(), self.version)
    }

    // == Persist ==
    /// Writes the full snapshot and bumps the version.
    ///
    /// The version only moves after a successful write. With persistence
    /// disabled this is a no-op.
    pub fn persist(&mut self) -> Result<()> {
        let Some(path) = self.options.snapshot_path.as_deref() else {
            return Ok(());
        };

        if let Err(err) = write_snapshot(path, self.version, &self.entries) {
            error!(path = %path.display(), error = %err, "Cache persist failed");
            return Err(err);
        }
        self.version += 1;

        debug!(version = self.version, entries = self.entries.len(), "Cache persisted");
        Ok(())
    }

    // == Load ==
    /// Restores entries from the snapshot file.
    ///
    /// Never fails: an unreadable or corrupt snapshot is logged and the store
    /// stays empty. Survivors are re-admitted through [`set`](Self::set) with
    /// their remaining TTL so their timers are armed like any fresh write.
    pub fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let Some(path) = self.options.snapshot_path.clone() else {
            return report;
        };

        let snapshot = match read_snapshot(&path) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(path = %path.display(), "No cache snapshot found");
                return report;
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Cache load failed, ignoring existing data");
                return report;
            }
        };

        if let Some(version) = snapshot.version {
            self.version = version;
        }

        let now = self.now_ms();
        for (key, item) in snapshot.items {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(key = %key, error = %err, "Skipping malformed snapshot item");
                    report.skipped += 1;
                    continue;
                }
            };

            let ttl = match entry.expires_at {
                Some(deadline) if now >= deadline => {
                    report.expired += 1;
                    continue;
                }
                Some(deadline) => Some(Ttl::Millis(
                    i64::try_from(deadline - now).unwrap_or(i64::MAX),
                )),
                None => None,
            };

            match self.set(key.clone(), entry.value, ttl) {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    warn!(key = %key, error = %err, "Skipping snapshot item");
                    report.skipped += 1;
                }
            }
        }

        info!(
            loaded = report.loaded,
            expired = report.expired,
            skipped = report.skipped,
            version = self.version,
            "Cache snapshot loaded"
        );
        report
    }

    // == Internals ==
    /// Arms a timer when the deadline is still ahead. Returns whether it did.
    fn schedule(&mut self, key: &str, deadline: u64, now: u64) -> bool {
        if deadline <= now {
            return false;
        }
        self.timers.arm(key, deadline);
        self.wakeup.notify_one();
        true
    }

    fn warn_long_ttl(&self, key: &str, ttl_ms: u64) {
        if ttl_ms > self.options.max_recommended_ttl_ms
            && !key.starts_with(&self.options.ttl_exempt_prefix)
        {
            warn!(
                key,
                ttl_ms,
                "Cache key has a very long TTL, consider a shorter one"
            );
        }
    }
}

/// Absolute deadline for `ttl` measured from `now`; zero means no deadline.
fn deadline_for(ttl: Option<&Ttl>, now: u64) -> Result<Option<u64>> {
    let Some(ttl) = ttl else {
        return Ok(None);
    };
    match ttl.to_millis()? {
        0 => Ok(None),
        ms => Ok(Some(now.saturating_add_signed(ms))),
    }
}
