//! `MetricsCollector`: lock-free process-wide counters (§4.1), grounded on
//! `examples/original_source/attribution/internal/metrics/system.go`'s
//! `sync/atomic` counters, translated to `std::sync::atomic` + `Instant`.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::health::HealthStatus;
use crate::snapshot::Snapshot;

#[derive(Default)]
struct Counters {
    request_count: AtomicU64,
    error_count: AtomicU64,
    total_response_time_ms: AtomicU64,
    events_processed: AtomicU64,
    customers_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    active_tasks: AtomicI64,
}

/// Process-wide metrics state. Cheap to clone (`Arc`-backed); register one
/// instance in application state and clone it into every component that
/// records activity.
#[derive(Clone)]
pub struct MetricsCollector {
    counters: Arc<Counters>,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
        }
    }

    /// Record a completed request and its response time.
    pub fn record_request(&self, duration_ms: u64) {
        self.counters.request_count.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_response_time_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.counters.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_processed(&self, count: u64) {
        self.counters
            .events_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_customer_served(&self) {
        self.counters
            .customers_served
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark one task (ingestion worker, aggregator loop) as started. There is
    /// no stable-Rust equivalent of `runtime.NumGoroutine()`; callers that
    /// spawn long-lived tasks should call this at spawn and
    /// [`Self::task_finished`] on exit so `Snapshot::active_tasks` means
    /// something.
    pub fn task_started(&self) {
        self.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_finished(&self) {
        self.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot with derived rates (§4.1).
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::derive(
            self.counters.request_count.load(Ordering::Relaxed),
            self.counters.error_count.load(Ordering::Relaxed),
            self.counters.total_response_time_ms.load(Ordering::Relaxed),
            self.counters.events_processed.load(Ordering::Relaxed),
            self.counters.customers_served.load(Ordering::Relaxed),
            self.counters.cache_hits.load(Ordering::Relaxed),
            self.counters.cache_misses.load(Ordering::Relaxed),
            self.start_time.elapsed().as_secs() as i64,
            self.counters.active_tasks.load(Ordering::Relaxed),
        )
    }

    /// `{status, issues[]}` derived from the current snapshot's thresholds.
    #[must_use]
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_snapshot(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_and_errors() {
        let collector = MetricsCollector::new();
        collector.record_request(100);
        collector.record_request(200);
        collector.record_error();

        let snap = collector.snapshot();
        assert_eq!(snap.request_count, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.total_response_time_ms, 300);
        assert!((snap.average_response_ms - 150.0).abs() < 1e-9);
    }

    #[test]
    fn records_cache_hits_and_misses() {
        let collector = MetricsCollector::new();
        collector.record_cache_hit();
        collector.record_cache_hit();
        collector.record_cache_miss();

        let snap = collector.snapshot();
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.cache_misses, 1);
        assert!((snap.cache_hit_rate - (200.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn task_tracking_is_symmetric() {
        let collector = MetricsCollector::new();
        collector.task_started();
        collector.task_started();
        collector.task_finished();
        assert_eq!(collector.snapshot().active_tasks, 1);
    }

    #[test]
    fn clone_shares_underlying_counters() {
        let collector = MetricsCollector::new();
        let clone = collector.clone();
        clone.record_request(50);
        assert_eq!(collector.snapshot().request_count, 1);
    }

    #[test]
    fn health_status_degrades_on_high_error_rate() {
        let collector = MetricsCollector::new();
        for _ in 0..10 {
            collector.record_request(1);
        }
        for _ in 0..2 {
            collector.record_error();
        }
        let health = collector.health_status();
        assert_eq!(health.status, crate::health::HealthState::Degraded);
    }
}
