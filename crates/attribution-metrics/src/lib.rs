//! # Attribution Metrics
//!
//! Process-wide metrics collection (§4.1): lock-free atomic counters, a
//! derived-rate snapshot, and a threshold-based health judgment.
//!
//! Grounded on `examples/original_source/attribution/internal/metrics/system.go`'s
//! `MetricsCollector`, translated from `sync/atomic` counters guarded by a
//! `time.Time` start mark to `std::sync::atomic` + `Instant`.
//!
//! Per-event-type/per-model counters and histograms (`events_processed_total`,
//! `attribution_calculations_total`, `attribution_calculation_duration_seconds`)
//! are emitted directly at their call sites in `attribution-ingestion` and
//! `attribution-engine` via the `metrics` crate's `counter!`/`histogram!`
//! macros, rather than routed through this collector — this crate owns only
//! the aggregate request/error/cache counters and the derived snapshot.

pub mod collector;
pub mod health;
pub mod snapshot;

pub use collector::MetricsCollector;
pub use health::{HealthState, HealthStatus};
pub use snapshot::{MemoryUsage, Snapshot};
