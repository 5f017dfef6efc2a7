//! Health check types and traits shared by the cache façade, the analytics
//! store adapter, and anything else that probes a backing dependency.
//!
//! Provides:
//! - `HealthStatus` enum for component states
//! - `HealthCheckResult` for individual probe results
//! - `HealthCheck` trait for implementing liveness probes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health status of a backing component (cache store, analytics store, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational.
    Online,
    /// Reachable but slow or otherwise impaired.
    Degraded,
    /// Not responding.
    #[default]
    Offline,
}

/// Result of a single liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    /// Component name (e.g. "cache", "analytics_store").
    pub component: String,
    pub status: HealthStatus,
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    #[must_use]
    pub fn online(component: &str, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Online,
            response_time_ms: Some(response_time.as_millis() as u64),
            error_message: None,
            checked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn degraded(component: &str, response_time: Duration, message: &str) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Degraded,
            response_time_ms: Some(response_time.as_millis() as u64),
            error_message: Some(message.to_string()),
            checked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn offline(component: &str, error: &str) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Offline,
            response_time_ms: None,
            error_message: Some(error.to_string()),
            checked_at: Utc::now(),
        }
    }
}

/// Implemented by anything with a liveness probe: the cache façade's backing
/// `KvStore`, the analytics store adapter, the ingestion pipeline's sinks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Name used in `HealthCheckResult::component` and aggregate health
    /// responses.
    fn component_name(&self) -> &str;

    /// Perform the probe. Implementations should bound their own latency
    /// (e.g. with `tokio::time::timeout`) rather than rely on the caller.
    async fn check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Offline).unwrap(),
            "\"offline\""
        );
    }

    #[test]
    fn result_constructors_set_expected_fields() {
        let online = HealthCheckResult::online("cache", Duration::from_millis(12));
        assert_eq!(online.status, HealthStatus::Online);
        assert_eq!(online.response_time_ms, Some(12));
        assert!(online.error_message.is_none());

        let degraded =
            HealthCheckResult::degraded("cache", Duration::from_millis(900), "slow ping");
        assert_eq!(degraded.status, HealthStatus::Degraded);
        assert_eq!(degraded.error_message.as_deref(), Some("slow ping"));

        let offline = HealthCheckResult::offline("analytics_store", "connection refused");
        assert_eq!(offline.status, HealthStatus::Offline);
        assert!(offline.response_time_ms.is_none());
    }
}
