//! `POST /v1/events`, `POST /v1/events/batch` (§6): synchronous accept/reject
//! at the HTTP boundary, no blocking on the ingestion pipeline's internals.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use attribution_core::{ApiResponse, CoreError, Event};

use crate::app::AppState;

const MAX_BATCH_SIZE: usize = 1_000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", post(submit_event))
        .route("/v1/events/batch", post(submit_batch))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    events: Vec<Event>,
}

/// Stamps timestamp/event_id the same way the worker pool would, so a 400
/// here reflects the same invariants the pipeline enforces downstream.
fn prepare(event: &mut Event, index: usize) -> Result<(), CoreError> {
    event.enrich(Utc::now().timestamp_millis(), index);
    event
        .validate()
        .map_err(|err| CoreError::BadRequest(err.to_string()))
}

async fn submit_event(
    State(state): State<AppState>,
    Json(mut event): Json<Event>,
) -> Result<Json<ApiResponse<serde_json::Value>>, CoreError> {
    prepare(&mut event, 0)?;
    state.ingestion.submit(event)?;
    state.metrics.record_event_processed(1);
    Ok(Json(ApiResponse::accepted(
        "event accepted",
        serde_json::json!({ "accepted": 1 }),
    )))
}

async fn submit_batch(
    State(state): State<AppState>,
    Json(mut body): Json<BatchRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, CoreError> {
    if body.events.is_empty() {
        return Err(CoreError::BadRequest("batch must contain at least one event".to_string()));
    }
    if body.events.len() > MAX_BATCH_SIZE {
        return Err(CoreError::BadRequest(format!(
            "batch exceeds maximum size of {MAX_BATCH_SIZE}"
        )));
    }
    for (index, event) in body.events.iter_mut().enumerate() {
        prepare(event, index)?;
    }

    let accepted = state.ingestion.submit_batch(body.events)?;
    state.metrics.record_event_processed(accepted as u64);
    Ok(Json(ApiResponse::accepted(
        "batch accepted",
        serde_json::json!({ "accepted": accepted }),
    )))
}
