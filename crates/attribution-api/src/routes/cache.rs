//! `DELETE /cache/invalidate` (§6): pattern-based cache eviction over the
//! logical key space, bounded by §5's 3s cache deadline.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::delete;
use axum::{Json, Router};
use serde::Deserialize;

use attribution_core::{ApiResponse, CoreError};

use crate::app::AppState;

const CACHE_DEADLINE: Duration = Duration::from_secs(3);

pub fn router() -> Router<AppState> {
    Router::new().route("/cache/invalidate", delete(invalidate))
}

#[derive(Debug, Deserialize)]
struct InvalidateQuery {
    pattern: String,
}

async fn invalidate(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, CoreError> {
    let deleted = tokio::time::timeout(CACHE_DEADLINE, state.cache.invalidate_pattern(&query.pattern))
        .await
        .unwrap_or_else(|_| Err(CoreError::Unavailable("cache deadline exceeded".to_string())))?;
    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": deleted }))))
}
