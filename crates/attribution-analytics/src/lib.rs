//! # Attribution Analytics
//!
//! The read-side façade (§4.5): cached customer/analytics/attribution/
//! dashboard reads backed by an [`AnalyticsStore`].
//!
//! Grounded on `examples/original_source/attribution/internal/database/clickhouse.go`
//! for the read shapes, generalized into a trait so the façade has no
//! compile-time dependency on a particular column store.

pub mod facade;
pub mod store;
pub mod types;

pub use facade::AnalyticsFacade;
pub use store::{AnalyticsStore, InMemoryAnalyticsStore};
#[cfg(feature = "postgres")]
pub use store::PostgresAnalyticsStore;
pub use types::{AttributionSummary, Customer, CustomerAnalytics, DashboardStats};
