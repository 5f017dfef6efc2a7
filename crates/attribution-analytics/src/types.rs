//! Read-model shapes served by [`crate::facade::AnalyticsFacade`].
//!
//! Grounded on the field sets returned by
//! `examples/original_source/attribution/internal/database/clickhouse.go`'s
//! `GetCustomers`/`GetCustomerAnalytics`/`GetAttribution`, typed here rather
//! than carried as `map[string]interface{}`. The source's `data_source`/
//! `cache_enabled` bookkeeping fields are dropped — that's exactly what the
//! `meta.source`/`meta.cache_hit` fields on `attribution_core::ApiResponse`
//! already cover at the HTTP envelope layer.

use serde::{Deserialize, Serialize};

/// One row of `GetCustomers`: a per-application rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub app_id: String,
    pub total_events: u64,
    pub total_users: u64,
    pub total_revenue: f64,
    pub platforms: Vec<String>,
}

/// `GetCustomerAnalytics(cid, limit)` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalytics {
    pub customer_id: String,
    pub total_events: u64,
    pub total_users: u64,
    pub total_revenue: f64,
    pub top_events: Vec<String>,
    pub top_platforms: Vec<String>,
    pub total_countries: u32,
}

/// `GetAttribution(cid, limit)` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionSummary {
    pub customer_id: String,
    pub attribution_model: String,
    pub total_conversions: u64,
    pub total_revenue: f64,
    pub top_channels: Vec<String>,
    pub conversion_rate: f64,
}

/// `GetDashboardStats()` response: the single global rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: u64,
    pub active_users: u64,
    pub revenue_today: f64,
    pub conversions: u64,
}
