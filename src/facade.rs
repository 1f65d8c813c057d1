//! Typed Facade
//!
//! Cloneable async handle over a shared [`CacheStore`], with named accessors
//! for well-known keys and the lifecycle of the background tasks.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{
    CacheInfo, CacheStore, CacheValue, KeyTtl, StoreOptions, UpdateOptions, UpdateOutcome,
};
use crate::config::Config;
use crate::duration::Ttl;
use crate::error::Result;
use crate::tasks::{spawn_persist_task, spawn_sweep_task, spawn_timer_task};

/// Store shared between the facade and the background tasks.
pub type SharedStore = Arc<RwLock<CacheStore>>;

/// Key of the logged-in user counter.
pub const LOGINED_COUNT_KEY: &str = "loginedCount";

// == Cache Handle ==
#[derive(Debug, Clone)]
pub struct Cache {
    store: SharedStore,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Cache {
    /// Wraps a store without starting any background task.
    pub fn new(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Opens the process cache: loads the snapshot, persists once right away
    /// and starts the timer driver, sweep and periodic persist tasks.
    ///
    /// Must be called from within a Tokio runtime. Fails if the initial
    /// persist cannot write the snapshot.
    pub fn open(config: &Config) -> Result<Self> {
        let mut store = CacheStore::new(StoreOptions::from_config(config));
        store.load();
        store.persist()?;

        let wakeup = store.timer_wakeup();
        let store = Arc::new(RwLock::new(store));
        let tasks = vec![
            spawn_timer_task(Arc::clone(&store), wakeup),
            spawn_sweep_task(Arc::clone(&store), config.sweep_interval),
            spawn_persist_task(Arc::clone(&store), config.persist_interval),
        ];

        info!(
            snapshot = ?config.snapshot_path(),
            "Cache opened"
        );
        Ok(Self {
            store,
            tasks: Arc::new(Mutex::new(tasks)),
        })
    }

    /// The underlying shared store.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    // == Generic Operations ==
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        ttl: Option<Ttl>,
    ) -> Result<()> {
        self.store.write().await.set(key, value, ttl)
    }

    /// Stores any serializable value.
    pub async fn set_value<T: Serialize + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Option<Ttl>,
    ) -> Result<()> {
        let value = CacheValue::from_serialize(value)?;
        self.set(key, value, ttl).await
    }

    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        self.store.write().await.get(key).cloned()
    }

    /// Reads a value back as `T`. A stored value of a different shape is an error.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await {
            Some(value) => Ok(Some(value.deserialize_into()?)),
            None => Ok(None),
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    pub async fn update(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        self.store.write().await.update(key, value, options)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn size(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    pub async fn ttl(&self, key: &str) -> KeyTtl {
        self.store.read().await.ttl(key)
    }

    pub async fn persist(&self) -> Result<()> {
        self.store.write().await.persist()
    }

    pub async fn info(&self) -> CacheInfo {
        self.store.read().await.info()
    }

    /// Stops the background tasks and clears the store.
    ///
    /// Does not write a final snapshot; call [`persist`](Self::persist) first
    /// if one is wanted.
    pub async fn destroy(&self) {
        for handle in self.tasks.lock().await.drain(..) {
            handle.abort();
        }
        self.store.write().await.clear();
        info!("Cache instance destroyed");
    }

    // == Named Accessors ==
    pub async fn logined_count(&self) -> Option<u64> {
        self.get(LOGINED_COUNT_KEY).await.and_then(|value| value.as_u64())
    }

    /// Sets the counter, or deletes it when `count` is None.
    pub async fn set_logined_count(&self, count: Option<u64>) -> Result<()> {
        match count {
            Some(count) => self.set(LOGINED_COUNT_KEY, count, None).await,
            None => {
                self.delete(LOGINED_COUNT_KEY).await;
                Ok(())
            }
        }
    }
}
