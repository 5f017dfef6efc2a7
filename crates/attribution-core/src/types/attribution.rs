//! Attribution result shapes produced by the attribution engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-touchpoint attribution outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributionData {
    pub touchpoint_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Fraction in `[0, 1]`.
    pub credit: f64,
    pub revenue: f64,
    /// 1-based position in ascending-timestamp order.
    pub position: usize,
    /// `conversion_timestamp - touchpoint_timestamp`, in milliseconds.
    pub time_delta: i64,
}

/// The outcome of running one attribution model over one journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResult {
    pub user_id: String,
    pub session_id: String,
    pub app_id: String,
    pub model_type: String,
    pub attribution: HashMap<String, AttributionData>,
    pub total_revenue: f64,
    pub calculated_at: i64,
    pub journey_length: usize,
    pub time_to_convert: i64,
}
