//! `GET /v1/customers`, `GET /v1/analytics/:cid`, `GET /v1/attribution/:cid`
//! (§6): read-side routes, each backed by [`AnalyticsFacade`]'s own TTL.
//!
//! Each call is bounded by the 5s store deadline from §5: a read that falls
//! through the cache to the backing store can't hang the handler past it.

use std::future::Future;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use attribution_cache::CacheOutcome;
use attribution_core::{ApiResponse, CoreError, ResponseMeta};

use crate::app::AppState;

const DEFAULT_LIMIT: usize = 100;
/// §5's bound on a read that may fall through to the `AnalyticsStore`.
const STORE_DEADLINE: Duration = Duration::from_secs(5);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/customers", get(list_customers))
        .route("/v1/analytics/:cid", get(customer_analytics))
        .route("/v1/attribution/:cid", get(attribution_summary))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

fn meta(started: Instant, outcome: CacheOutcome) -> ResponseMeta {
    ResponseMeta {
        cache_hit: Some(matches!(outcome, CacheOutcome::Hit)),
        response_time_ms: Some(started.elapsed().as_millis() as u64),
        source: Some(
            match outcome {
                CacheOutcome::Hit => "cache",
                CacheOutcome::Filled => "store",
            }
            .to_string(),
        ),
    }
}

async fn with_store_deadline<T>(
    fut: impl Future<Output = Result<(T, CacheOutcome), CoreError>>,
) -> Result<(T, CacheOutcome), CoreError> {
    tokio::time::timeout(STORE_DEADLINE, fut)
        .await
        .unwrap_or_else(|_| Err(CoreError::Unavailable("analytics store deadline exceeded".to_string())))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<attribution_analytics::Customer>>>, CoreError> {
    let started = Instant::now();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let (customers, outcome) = with_store_deadline(state.analytics.get_customers(limit)).await?;
    state.metrics.record_customer_served();
    Ok(Json(ApiResponse::ok_with_meta(customers, meta(started, outcome))))
}

async fn customer_analytics(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<attribution_analytics::CustomerAnalytics>>, CoreError> {
    let started = Instant::now();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let (analytics, outcome) =
        with_store_deadline(state.analytics.get_customer_analytics(&customer_id, limit)).await?;
    Ok(Json(ApiResponse::ok_with_meta(analytics, meta(started, outcome))))
}

async fn attribution_summary(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<attribution_analytics::AttributionSummary>>, CoreError> {
    let started = Instant::now();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let (summary, outcome) =
        with_store_deadline(state.analytics.get_attribution(&customer_id, limit)).await?;
    Ok(Json(ApiResponse::ok_with_meta(summary, meta(started, outcome))))
}
