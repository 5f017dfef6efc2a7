//! `MetricsCollector::health_status()` — a threshold judgment over a
//! [`crate::Snapshot`], not a liveness probe (see `attribution_core::health`
//! for that).

use serde::Serialize;

use crate::Snapshot;

const ERROR_RATE_THRESHOLD: f64 = 5.0;
const MEMORY_MB_THRESHOLD: f64 = 500.0;
const AVG_RESPONSE_MS_THRESHOLD: f64 = 1000.0;

/// Coarse health judgment derived from a metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
}

/// `{status, issues[]}` from §4.1.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    pub issues: Vec<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut issues = Vec::new();

        if snapshot.error_rate > ERROR_RATE_THRESHOLD {
            issues.push("high_error_rate".to_string());
        }
        if snapshot.memory.resident_mb > MEMORY_MB_THRESHOLD {
            issues.push("high_memory_usage".to_string());
        }
        if snapshot.average_response_ms > AVG_RESPONSE_MS_THRESHOLD {
            issues.push("slow_response_time".to_string());
        }

        let status = if issues.is_empty() {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        };

        Self { status, issues }
    }
}
