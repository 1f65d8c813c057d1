//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries,
//! independent of the per-key timers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::facade::SharedStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task sleeps for `interval` between runs and takes the write lock only
/// for the sweep itself. It catches entries whose timer never fired, such as
/// ones admitted while a timer driver was not running.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(1_800));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(cache: SharedStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut store = cache.write().await;
                let removed = store.sweep_expired();
                (removed, store.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Cache sweep removed expired entries");
            } else {
                debug!(remaining, "Cache sweep found no expired entries");
            }
        }
    })
}
