//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{extract::State, Json};
use tracing::info;

use crate::cache::CacheInfo;
use crate::error::Result;
use crate::facade::Cache;
use crate::models::{HealthResponse, PersistResponse};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

/// Handler for GET /admin/cache
pub async fn info_handler(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.cache.info().await)
}

/// Handler for POST /admin/cache/persist
///
/// Writes a snapshot immediately. A failed write surfaces as a 500.
pub async fn persist_handler(State(state): State<AppState>) -> Result<Json<PersistResponse>> {
    state.cache.persist().await?;
    let info = state.cache.info().await;
    info!(version = info.version, size = info.size, "Manual cache persist");

    Ok(Json(PersistResponse::new(info)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, StoreOptions};
    use crate::error::CacheError;
    use tempfile::TempDir;

    fn state_with(options: StoreOptions) -> AppState {
        AppState::new(Cache::new(CacheStore::new(options)))
    }

    #[tokio::test]
    async fn test_info_handler() {
        let state = state_with(StoreOptions::default());
        state.cache.set("a", 1i64, None).await.unwrap();
        state.cache.set("b", 2i64, Some("1m".into())).await.unwrap();

        let Json(info) = info_handler(State(state)).await;
        assert_eq!(info.size, 2);
        assert_eq!(info.alive_count, 1);
        assert_eq!(info.expire_count, 1);
        assert_eq!(info.expire_rate, 0.5);
    }

    #[tokio::test]
    async fn test_persist_handler_bumps_version() {
        let dir = TempDir::new().unwrap();
        let state = state_with(StoreOptions::default().with_snapshot(dir.path().join("cache.json")));

        let Json(response) = persist_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.info.version, 1);
        assert!(dir.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn test_persist_handler_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let state = state_with(
            StoreOptions::default().with_snapshot(dir.path().join("missing").join("cache.json")),
        );

        let result = persist_handler(State(state.clone())).await;
        assert!(matches!(result, Err(CacheError::Persistence(_))));
        assert_eq!(state.cache.info().await.version, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
