//! Integration tests driving the full router (§6) end to end against the
//! in-memory analytics store and sinks — no Postgres required.

use attribution_api::app;
use attribution_config::{CacheSettings, IngestionSettings, ServerSettings, Settings};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn test_settings() -> Settings {
    Settings {
        server: ServerSettings::default(),
        cache: CacheSettings::default(),
        ingestion: IngestionSettings::default(),
        analytics_store: None,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_online() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "online");

    state.shutdown().await;
}

#[tokio::test]
async fn submit_valid_event_is_accepted() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let payload = serde_json::json!({
        "eventId": "evt_1",
        "appId": "com.example.app",
        "eventType": "click",
        "platform": "ios",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/events")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    state.shutdown().await;
}

#[tokio::test]
async fn submit_event_missing_app_id_is_rejected() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let payload = serde_json::json!({
        "eventId": "evt_1",
        "appId": "",
        "eventType": "click",
        "platform": "ios",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/events")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    state.shutdown().await;
}

#[tokio::test]
async fn submit_batch_rejects_oversized_payload() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let events: Vec<_> = (0..1_001)
        .map(|i| {
            serde_json::json!({
                "eventId": format!("evt_{i}"),
                "appId": "com.example.app",
                "eventType": "click",
                "platform": "ios",
            })
        })
        .collect();
    let payload = serde_json::json!({ "events": events });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/events/batch")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    state.shutdown().await;
}

#[tokio::test]
async fn customers_list_round_trips_through_cache() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let first = router
        .clone()
        .oneshot(Request::builder().uri("/v1/customers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    assert_eq!(first_body["meta"]["cacheHit"], false);

    let second = router
        .oneshot(Request::builder().uri("/v1/customers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_json(second).await;
    assert_eq!(second_body["meta"]["cacheHit"], true);

    state.shutdown().await;
}

#[tokio::test]
async fn cache_invalidate_accepts_pattern() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/invalidate?pattern=customers:*")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    state.shutdown().await;
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-request-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-id"
    );

    state.shutdown().await;
}

#[tokio::test]
async fn metrics_endpoint_reports_a_composite_snapshot() {
    let (router, state) = app::create_app(test_settings()).await.unwrap();

    let response = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["process"].is_object());
    assert!(body["cache"].is_object());
    assert!(body["ingestion"].is_object());
    assert!(body["engine"].is_object());

    state.shutdown().await;
}
