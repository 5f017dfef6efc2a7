//! Error taxonomy for API boundaries (§7).
//!
//! Internal code propagates `anyhow::Result`; this enum exists at the
//! boundary where an error needs an HTTP status and a machine-readable code.

use serde::Serialize;

/// The error taxonomy from §7.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Parse/validation failure at the HTTP boundary.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The ingestion intake channel is saturated.
    #[error("queue full")]
    QueueFull,

    /// The cache or analytical store is unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Cache-only: key not present.
    #[error("cache miss")]
    Miss,

    /// Requested attribution model is not registered.
    #[error("unknown attribution model: {0}")]
    UnknownModel(String),

    /// Journey has no touchpoints.
    #[error("journey has no touchpoints")]
    EmptyJourney,

    /// Position-based model parameters do not sum to 1.0.
    #[error("invalid attribution parameters: {0}")]
    InvalidParameters(String),

    /// Stored value could not be deserialized into the caller's shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Internal/unexpected error (wraps `anyhow::Error`).
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::QueueFull => "QUEUE_FULL",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Miss => "MISS",
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::EmptyJourney => "EMPTY_JOURNEY",
            Self::InvalidParameters(_) => "INVALID_PARAMETERS",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_)
            | Self::UnknownModel(_)
            | Self::EmptyJourney
            | Self::InvalidParameters(_) => 400,
            Self::QueueFull | Self::Unavailable(_) => 503,
            Self::Miss | Self::Decode(_) => 404,
            Self::Internal(_) => 500,
        }
    }
}

/// Standardized error body. 5xx responses carry no internal stack detail —
/// `message` is always caller-safe text, never a formatted `anyhow` chain.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "axum", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }
}

impl From<&CoreError> for ErrorResponse {
    fn from(err: &CoreError) -> Self {
        let message = match err {
            CoreError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        Self::new(message, err.code())
    }
}

#[cfg(feature = "axum")]
mod axum_impl {
    use super::{CoreError, ErrorResponse};
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };

    impl IntoResponse for CoreError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = ErrorResponse::from(&self);
            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(CoreError::QueueFull.status_code(), 503);
        assert_eq!(CoreError::EmptyJourney.status_code(), 400);
        assert_eq!(CoreError::UnknownModel("x".into()).status_code(), 400);
        assert_eq!(CoreError::InvalidParameters("x".into()).status_code(), 400);
        assert_eq!(CoreError::Unavailable("x".into()).status_code(), 503);
        assert_eq!(
            CoreError::Internal(anyhow::anyhow!("boom")).status_code(),
            500
        );
    }

    #[test]
    fn internal_error_hides_detail_in_response() {
        let err = CoreError::Internal(anyhow::anyhow!("leaked secret path"));
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.error, "internal server error");
        assert_eq!(resp.code, "INTERNAL_ERROR");
    }
}
