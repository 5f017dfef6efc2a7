//! Request ID middleware for request correlation.
//!
//! Generates or preserves a unique request ID for each HTTP request,
//! adding it to tracing spans and response headers for correlation.

use axum::{
    extract::Request,
    http::{header::HeaderValue, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or preserves a request ID for correlation.
///
/// This middleware:
/// - Extracts `x-request-id` header from incoming request if present
/// - Generates a new UUID v4 if header is missing
/// - Records the request ID in the current tracing span
/// - Adds the request ID to response headers
///
/// # Examples
///
/// The middleware should be registered first in the middleware chain:
/// ```rust
/// use axum::{Router, routing::get};
/// use attribution_api::middleware::request_id_middleware;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(axum::middleware::from_fn(request_id_middleware));
/// ```
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    // Extract or generate request ID
    let request_id = extract_or_generate_request_id(request.headers());

    // Add to tracing span context
    Span::current().record("request_id", &request_id);

    // Process request and get response
    let mut response = next.run(request).await;

    // Add request ID to response headers
    add_request_id_to_response(&mut response, &request_id);

    response
}

/// Extract request ID from headers or generate a new one.
fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Add request ID to response headers.
fn add_request_id_to_response(response: &mut Response, request_id: &str) {
    if let Ok(header_value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }
}
