//! The point-in-time view returned by [`crate::MetricsCollector::snapshot`].

use serde::Serialize;

/// Resident/allocated memory, best-effort on stable Rust.
///
/// Populated from `/proc/self/status` on Linux (`VmRSS`/`VmData`); zero on
/// other platforms. This is a deliberate simplification, not a silent gap —
/// there is no portable stable-Rust equivalent of `runtime.ReadMemStats`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub resident_mb: f64,
    pub allocated_mb: f64,
}

#[cfg(target_os = "linux")]
pub(crate) fn read_memory_usage() -> MemoryUsage {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return MemoryUsage::default();
    };
    let kb_field = |line: &str| -> f64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let mut resident_kb = 0.0;
    let mut data_kb = 0.0;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            resident_kb = kb_field(&format!("VmRSS:{rest}"));
        } else if let Some(rest) = line.strip_prefix("VmData:") {
            data_kb = kb_field(&format!("VmData:{rest}"));
        }
    }
    MemoryUsage {
        resident_mb: resident_kb / 1024.0,
        allocated_mb: data_kb / 1024.0,
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn read_memory_usage() -> MemoryUsage {
    MemoryUsage::default()
}

/// Counters plus derived rates, bound to process lifetime (§4.1).
///
/// Consistent per field but not cross-field atomic: each counter is read
/// independently, so two fields in the same snapshot may reflect slightly
/// different instants under concurrent load. This is intentional — a
/// cross-field lock would put a mutex on every hot-path increment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub request_count: u64,
    pub error_count: u64,
    pub total_response_time_ms: u64,
    pub events_processed: u64,
    pub customers_served: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,

    pub uptime_seconds: i64,

    pub average_response_ms: f64,
    pub events_per_second: f64,
    pub error_rate: f64,
    pub cache_hit_rate: f64,

    pub memory: MemoryUsage,
    pub active_tasks: i64,
    /// Always `0`: Rust has no tracing garbage collector. Reported rather
    /// than omitted so callers mirroring the original dashboard schema don't
    /// have to special-case a missing field.
    pub gc_count: u32,
}

impl Snapshot {
    pub(crate) fn derive(
        request_count: u64,
        error_count: u64,
        total_response_time_ms: u64,
        events_processed: u64,
        customers_served: u64,
        cache_hits: u64,
        cache_misses: u64,
        uptime_seconds: i64,
        active_tasks: i64,
    ) -> Self {
        let average_response_ms = if request_count > 0 {
            total_response_time_ms as f64 / request_count as f64
        } else {
            0.0
        };
        let events_per_second = if uptime_seconds > 0 {
            request_count as f64 / uptime_seconds as f64
        } else {
            0.0
        };
        let error_rate = if request_count > 0 {
            100.0 * error_count as f64 / request_count as f64
        } else {
            0.0
        };
        let total_cache_ops = cache_hits + cache_misses;
        let cache_hit_rate = if total_cache_ops > 0 {
            100.0 * cache_hits as f64 / total_cache_ops as f64
        } else {
            0.0
        };

        Self {
            request_count,
            error_count,
            total_response_time_ms,
            events_processed,
            customers_served,
            cache_hits,
            cache_misses,
            uptime_seconds,
            average_response_ms,
            events_per_second,
            error_rate,
            cache_hit_rate,
            memory: read_memory_usage(),
            active_tasks,
            gc_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_requests_yield_zero_rates() {
        let snap = Snapshot::derive(0, 0, 0, 0, 0, 0, 0, 0, 0);
        assert_eq!(snap.average_response_ms, 0.0);
        assert_eq!(snap.events_per_second, 0.0);
        assert_eq!(snap.error_rate, 0.0);
        assert_eq!(snap.cache_hit_rate, 0.0);
    }

    #[test]
    fn derives_rates_from_counters() {
        let snap = Snapshot::derive(100, 5, 5_000, 40, 10, 80, 20, 50, 3);
        assert!((snap.average_response_ms - 50.0).abs() < 1e-9);
        assert!((snap.events_per_second - 2.0).abs() < 1e-9);
        assert!((snap.error_rate - 5.0).abs() < 1e-9);
        assert!((snap.cache_hit_rate - 80.0).abs() < 1e-9);
    }
}
