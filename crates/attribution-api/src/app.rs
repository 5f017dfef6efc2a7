//! Application setup and configuration.
//!
//! Creates the Axum router with all routes and middleware, and wires up the
//! singleton chain from §9: `MetricsCollector -> CacheFacade ->
//! AttributionEngine -> IngestionPipeline -> AnalyticsFacade`. Shutdown runs
//! in the exact reverse order, driven by one shared `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use attribution_analytics::{AnalyticsFacade, AnalyticsStore, InMemoryAnalyticsStore};
use attribution_cache::store::MokaStore;
use attribution_cache::CacheFacade;
use attribution_config::Settings;
use attribution_engine::AttributionEngine;
use attribution_ingestion::{InMemoryAnalyticsSink, InMemoryMessageBusSink, IngestionPipeline, NullDeadLetterSink};
use attribution_metrics::MetricsCollector;
use tokio_util::sync::CancellationToken;

use crate::routes;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub metrics: MetricsCollector,
    pub cache: Arc<CacheFacade>,
    pub engine: Arc<AttributionEngine>,
    pub ingestion: IngestionPipeline,
    pub analytics: Arc<AnalyticsFacade>,
    /// Renders the `metrics`-crate-backed counter/histogram families (engine
    /// calculation counts, ingestion throughput) in Prometheus exposition
    /// format; `routes::metrics` falls back to it for `text/plain` callers.
    pub prometheus_handle: axum_prometheus::PrometheusHandle,
    /// Root shutdown signal (§5): SIGINT/SIGTERM propagates here and
    /// everything downstream (aggregator, workers, `axum::serve`) selects on
    /// it.
    pub cancellation: CancellationToken,
}

impl AppState {
    /// Reverse of the boot order in §9: stop the ingestion pipeline (drains
    /// its workers), then the engine (no-op, kept for parity), leaving the
    /// cache and metrics collector to drop with the process.
    pub async fn shutdown(&self) {
        self.ingestion.stop().await;
        self.engine.stop();
        info!("application state shut down");
    }
}

/// Create the Axum application with all routes and middleware.
pub async fn create_app(settings: Settings) -> Result<(Router, AppState)> {
    let metrics = MetricsCollector::new();

    let cache_store = Arc::new(MokaStore::new(settings.cache.max_capacity));
    let cache = Arc::new(CacheFacade::new(
        cache_store,
        settings.cache.key_prefix.clone(),
        Duration::from_secs(settings.cache.default_ttl_secs),
        metrics.clone(),
    ));

    let engine = Arc::new(AttributionEngine::new());

    let analytics_store = build_analytics_store(&settings).await?;
    let analytics = Arc::new(AnalyticsFacade::new(cache.clone(), analytics_store));

    let ingestion = IngestionPipeline::new(
        settings.ingestion.clone(),
        metrics.clone(),
        cache.clone(),
        Arc::new(InMemoryAnalyticsSink::new()),
        Arc::new(InMemoryMessageBusSink::new()),
        Arc::new(NullDeadLetterSink::new()),
    );
    ingestion.start().await;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let cancellation = CancellationToken::new();

    let state = AppState {
        settings: Arc::new(settings),
        metrics,
        cache,
        engine,
        ingestion,
        analytics,
        prometheus_handle,
        cancellation,
    };

    let app = Router::new()
        .merge(routes::events::router())
        .merge(routes::analytics::router())
        .merge(routes::health::router())
        .merge(routes::metrics::router())
        .merge(routes::cache::router())
        .merge(routes::api_docs())
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(axum::middleware::from_fn(
                    crate::middleware::request_id_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    crate::middleware::metrics_middleware,
                ))
                .layer(prometheus_layer),
        );

    Ok((app, state))
}

/// Builds the backing `AnalyticsStore` (§4.5): Postgres when `DATABASE_URL`
/// is configured, the in-memory fixture otherwise. The real column store's
/// schema/dialect is out of scope, so falling back never fails startup.
async fn build_analytics_store(settings: &Settings) -> Result<Arc<dyn AnalyticsStore>> {
    #[cfg(feature = "postgres")]
    if let Some(store_settings) = settings.analytics_store.as_ref() {
        use secrecy::ExposeSecret;
        use sqlx::postgres::PgPoolOptions;

        let pool = PgPoolOptions::new()
            .max_connections(store_settings.max_connections)
            .connect(store_settings.database_url.expose_secret())
            .await?;
        info!("analytics store connected to Postgres");
        return Ok(Arc::new(attribution_analytics::PostgresAnalyticsStore::new(pool)));
    }
    #[cfg(not(feature = "postgres"))]
    let _ = settings;

    info!("analytics store running on in-memory fixture (no DATABASE_URL configured)");
    Ok(Arc::new(InMemoryAnalyticsStore::new()))
}
