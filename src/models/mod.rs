//! Response models for the admin API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies.

pub mod responses;

pub use responses::{ErrorResponse, HealthResponse, PersistResponse};
