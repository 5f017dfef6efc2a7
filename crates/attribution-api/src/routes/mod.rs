//! HTTP surface (§6): event ingestion, read-side analytics, operational
//! endpoints (health/metrics/cache).

pub mod analytics;
pub mod cache;
pub mod events;
pub mod health;
pub mod metrics;

use axum::Router;

use crate::app::AppState;

/// OpenAPI document placeholder merge point. The teacher wires `utoipa`
/// per-handler annotations; this surface is small enough that a single
/// router-level doc isn't worth the macro noise yet.
pub fn api_docs() -> Router<AppState> {
    Router::new()
}
