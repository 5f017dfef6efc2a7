//! # Attribution Core
//!
//! Shared types, error taxonomy, and health-check traits for the attribution
//! platform's crates.
//!
//! This crate provides:
//! - Domain types shared across the pipeline (`Event`, `Touchpoint`,
//!   `Journey`, `AttributionResult`)
//! - The boundary error taxonomy (`CoreError`) using `thiserror`
//! - The uniform HTTP response envelope (`ApiResponse`)
//! - Health check types and traits for backing-store liveness probes
//! - A `Result` alias over `anyhow` for internal operations

pub mod error;
pub mod health;
pub mod types;

pub use error::{CoreError, ErrorResponse};
pub use health::{HealthCheck, HealthCheckResult, HealthStatus};
pub use types::{
    AttributionData, AttributionResult, Event, EventKind, EventValidationError, Journey,
    JourneyError, Platform, ResponseMeta, Touchpoint,
};
pub use types::ApiResponse;

/// Result type alias for internal operations using `anyhow`.
pub type Result<T> = anyhow::Result<T>;
