//! Request metrics middleware: feeds the §4.1 `RecordRequest`/`RecordError`
//! operations from the live request path instead of leaving them as
//! unit-test-only calls.
//!
//! This is distinct from the `axum-prometheus` layer installed in
//! [`crate::app::create_app`]: that one exports Prometheus exposition text,
//! this one drives [`MetricsCollector`]'s own snapshot (`average_response_ms`,
//! `error_rate`, and the [`attribution_metrics::HealthStatus`] thresholds
//! surfaced at `/health`).

use std::time::Instant;

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::app::AppState;

/// Records request duration on every response and an error on 5xx.
pub async fn metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;

    state.metrics.record_request(started.elapsed().as_millis() as u64);
    if response.status().is_server_error() {
        state.metrics.record_error();
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution_config::Settings;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    // Exercises the middleware directly against a `MetricsCollector`,
    // bypassing `AppState`/`create_app` (which needs a bound listener and a
    // configured analytics store) since only `state.metrics` is under test.
    fn test_state_with(metrics: attribution_metrics::MetricsCollector) -> AppState {
        AppState {
            settings: std::sync::Arc::new(Settings {
                server: Default::default(),
                cache: Default::default(),
                ingestion: Default::default(),
                analytics_store: None,
            }),
            metrics,
            cache: std::sync::Arc::new(attribution_cache::CacheFacade::new(
                std::sync::Arc::new(attribution_cache::store::MokaStore::new(1024)),
                "test:".to_string(),
                std::time::Duration::from_secs(60),
                attribution_metrics::MetricsCollector::new(),
            )),
            engine: std::sync::Arc::new(attribution_engine::AttributionEngine::new()),
            ingestion: attribution_ingestion::IngestionPipeline::new(
                Default::default(),
                attribution_metrics::MetricsCollector::new(),
                std::sync::Arc::new(attribution_cache::CacheFacade::new(
                    std::sync::Arc::new(attribution_cache::store::MokaStore::new(1024)),
                    "test:".to_string(),
                    std::time::Duration::from_secs(60),
                    attribution_metrics::MetricsCollector::new(),
                )),
                std::sync::Arc::new(attribution_ingestion::InMemoryAnalyticsSink::new()),
                std::sync::Arc::new(attribution_ingestion::InMemoryMessageBusSink::new()),
                std::sync::Arc::new(attribution_ingestion::NullDeadLetterSink::new()),
            ),
            analytics: std::sync::Arc::new(attribution_analytics::AnalyticsFacade::new(
                std::sync::Arc::new(attribution_cache::CacheFacade::new(
                    std::sync::Arc::new(attribution_cache::store::MokaStore::new(1024)),
                    "test:".to_string(),
                    std::time::Duration::from_secs(60),
                    attribution_metrics::MetricsCollector::new(),
                )),
                std::sync::Arc::new(attribution_analytics::InMemoryAnalyticsStore::new()),
            )),
            prometheus_handle: axum_prometheus::PrometheusMetricLayer::pair().1,
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_records_request_on_success() {
        let metrics = attribution_metrics::MetricsCollector::new();
        let state = test_state_with(metrics.clone());

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(state.clone(), metrics_middleware))
            .with_state(state);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(metrics.snapshot().request_count, 1);
        assert_eq!(metrics.snapshot().error_count, 0);
    }

    #[tokio::test]
    async fn test_records_error_on_server_error() {
        let metrics = attribution_metrics::MetricsCollector::new();
        let state = test_state_with(metrics.clone());

        let app = Router::new()
            .route(
                "/boom",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .layer(axum::middleware::from_fn_with_state(state.clone(), metrics_middleware))
            .with_state(state);

        let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(metrics.snapshot().request_count, 1);
        assert_eq!(metrics.snapshot().error_count, 1);
    }

    #[tokio::test]
    async fn test_client_error_does_not_count_as_server_error() {
        let metrics = attribution_metrics::MetricsCollector::new();
        let state = test_state_with(metrics.clone());

        let app = Router::new()
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(axum::middleware::from_fn_with_state(state.clone(), metrics_middleware))
            .with_state(state);

        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(metrics.snapshot().request_count, 1);
        assert_eq!(metrics.snapshot().error_count, 0);
    }
}
