//! `GET /health` (§6): aggregate liveness — the cache façade's own probe
//! plus the process-wide error/latency health judgment.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use attribution_core::health::{HealthCheck, HealthCheckResult, HealthStatus as ComponentStatus};

use crate::app::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    components: Vec<HealthCheckResult>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = vec![state.cache.check().await];
    let process_health = state.metrics.health_status();

    let any_offline = components
        .iter()
        .any(|c| c.status == ComponentStatus::Offline);
    let status = if any_offline {
        "offline"
    } else if matches!(process_health.status, attribution_metrics::HealthState::Degraded) {
        "degraded"
    } else {
        "online"
    };

    Json(HealthResponse { status, components })
}
