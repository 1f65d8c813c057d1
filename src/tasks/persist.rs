//! Periodic Persist Task

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::facade::SharedStore;

/// Spawns a task that writes a snapshot every `interval`.
///
/// Write failures are logged and the task keeps running; they never reach
/// the caller.
pub fn spawn_persist_task(cache: SharedStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache persist task");

        loop {
            tokio::time::sleep(interval).await;

            let result = {
                let mut store = cache.write().await;
                store.persist().map(|()| store.version())
            };

            match result {
                Ok(version) => debug!(version, "Periodic cache persist complete"),
                Err(err) => error!(error = %err, "Periodic cache persist failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    use crate::cache::{CacheStore, StoreOptions};

    #[tokio::test]
    async fn test_persist_task_bumps_version() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions::default().with_snapshot(dir.path().join("cache.json"));
        let cache = Arc::new(RwLock::new(CacheStore::new(options)));
        cache.write().await.set("k", "v", None).unwrap();

        let handle = spawn_persist_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.abort();

        let version = cache.read().await.version();
        assert!(version >= 1, "Task should have persisted at least once");

        let raw = std::fs::read_to_string(dir.path().join("cache.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot["version"], version - 1);
        assert_eq!(snapshot["items"]["k"]["value"], "v");
    }

    #[tokio::test]
    async fn test_persist_task_survives_write_failures() {
        let dir = TempDir::new().unwrap();
        let options =
            StoreOptions::default().with_snapshot(dir.path().join("missing").join("cache.json"));
        let cache = Arc::new(RwLock::new(CacheStore::new(options)));

        let handle = spawn_persist_task(cache.clone(), Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!handle.is_finished(), "Failures must not stop the task");
        assert_eq!(cache.read().await.version(), 0);
        handle.abort();
    }
}
