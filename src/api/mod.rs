//! API Module
//!
//! HTTP handlers and routing for the cache admin endpoints.
//!
//! # Endpoints
//! - `GET /admin/cache` - Cache summary
//! - `POST /admin/cache/persist` - Write a snapshot now
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
