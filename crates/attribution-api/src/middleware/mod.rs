//! Middleware for request processing.
//!
//! Contains middleware functions for enhancing request handling,
//! including request ID correlation, tracing, and other cross-cutting concerns.

pub mod metrics;
pub mod request_id;

pub use metrics::metrics_middleware;
pub use request_id::request_id_middleware;
