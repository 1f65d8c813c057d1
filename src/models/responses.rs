//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheInfo;

/// Response body for a manual persist (POST /admin/cache/persist)
#[derive(Debug, Clone, Serialize)]
pub struct PersistResponse {
    /// Success message
    pub message: String,
    /// Cache summary after the write
    pub info: CacheInfo,
}

impl PersistResponse {
    pub fn new(info: CacheInfo) -> Self {
        Self {
            message: format!("Cache persisted, next snapshot version {}", info.version),
            info,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;

    #[test]
    fn test_persist_response_serialize() {
        let info = CacheInfo::collect(std::iter::empty::<&CacheEntry>(), 3);
        let json = serde_json::to_value(PersistResponse::new(info)).unwrap();

        assert_eq!(json["info"]["version"], 3);
        assert_eq!(json["info"]["size"], 0);
        assert!(json["message"].as_str().unwrap().contains("persisted"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
