//! Timer Driver Task
//!
//! Fires per-key expiry timers on time. The driver sleeps until the earliest
//! armed deadline and is woken early whenever the store arms a new timer,
//! since that timer may be due sooner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::facade::SharedStore;

/// Spawns the task that evicts keys when their timers come due.
///
/// `wakeup` must be the store's [`timer_wakeup`](crate::cache::CacheStore::timer_wakeup).
pub fn spawn_timer_task(cache: SharedStore, wakeup: Arc<Notify>) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Starting cache timer driver");

        loop {
            let wait = {
                let store = cache.read().await;
                store
                    .next_timer_deadline()
                    .map(|deadline| Duration::from_millis(deadline.saturating_sub(store.now_ms())))
            };

            match wait {
                None => {
                    wakeup.notified().await;
                    continue;
                }
                Some(wait) if !wait.is_zero() => {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = wakeup.notified() => continue,
                    }
                }
                Some(_) => {}
            }

            let fired = cache.write().await.fire_due_timers();
            if fired > 0 {
                trace!(fired, "Cache timers fired");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::RwLock;

    use crate::cache::{CacheStore, StoreOptions};
    use crate::duration::Ttl;

    fn shared_store() -> (SharedStore, Arc<Notify>) {
        let store = CacheStore::new(StoreOptions::default());
        let wakeup = store.timer_wakeup();
        (Arc::new(RwLock::new(store)), wakeup)
    }

    #[tokio::test]
    async fn test_timer_fires_at_deadline() {
        let (cache, wakeup) = shared_store();
        let handle = spawn_timer_task(cache.clone(), wakeup);

        cache
            .write()
            .await
            .set("short", "value", Some(Ttl::Millis(100)))
            .unwrap();
        assert!(cache.write().await.has("short"));

        tokio::time::sleep(Duration::from_millis(300)).await;
        {
            let store = cache.read().await;
            assert_eq!(store.len(), 0, "Timer should have evicted the key");
            assert_eq!(store.pending_timers(), 0);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_earlier_timer_wakes_driver() {
        let (cache, wakeup) = shared_store();
        cache
            .write()
            .await
            .set("late", "value", Some(Ttl::from("1h")))
            .unwrap();
        let handle = spawn_timer_task(cache.clone(), wakeup);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Driver is now sleeping towards the one-hour deadline
        cache
            .write()
            .await
            .set("soon", "value", Some(Ttl::Millis(50)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        {
            let mut store = cache.write().await;
            assert_eq!(store.len(), 1);
            assert!(store.has("late"));
            assert_eq!(store.pending_timers(), 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_overwritten_timer_does_not_fire_early() {
        let (cache, wakeup) = shared_store();
        let handle = spawn_timer_task(cache.clone(), wakeup);

        {
            let mut store = cache.write().await;
            store.set("k", "v1", Some(Ttl::Millis(100))).unwrap();
            store.delete("k");
            store.set("k", "v2", Some(Ttl::Millis(2_000))).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.write().await.has("k"), "Stale timer must not evict the key");
        handle.abort();
    }
}
