//! `GET /metrics` (§6): a composite JSON snapshot by default — the process
//! collector, the cache façade, the ingestion pipeline, and the attribution
//! engine — or the raw Prometheus exposition of the `metrics`-crate counter/
//! histogram families for `Accept: text/plain` callers (§4.1's
//! `prometheus_handle()` hook).

use axum::http::header::ACCEPT;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use attribution_cache::CacheStats;
use attribution_engine::EngineMetrics;
use attribution_ingestion::IngestionMetrics;
use attribution_metrics::Snapshot;

use crate::app::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsResponse {
    process: Snapshot,
    cache: CacheStats,
    ingestion: IngestionMetrics,
    engine: EngineMetrics,
}

async fn metrics(
    axum::extract::State(state): axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    let wants_prometheus = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/plain"));

    if wants_prometheus {
        return state.prometheus_handle.render().into_response();
    }

    Json(MetricsResponse {
        process: state.metrics.snapshot(),
        cache: state.cache.get_stats().await,
        ingestion: state.ingestion.metrics(),
        engine: state.engine.metrics(),
    })
    .into_response()
}
