//! Touchpoint and Journey: the attribution engine's input shapes.

use serde::{Deserialize, Serialize};

use super::event::{Event, EventKind, Platform};

/// An immutable projection of an [`Event`] used by attribution. Touchpoints
/// are constructed once (from an `Event`) and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Touchpoint {
    pub id: String,
    pub app_id: String,
    pub user_id: String,
    pub session_id: String,
    pub event_type: EventKind,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub platform: Platform,
    pub revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub metadata: std::collections::HashMap<String, serde_json::Value>,
}

impl Touchpoint {
    /// Project an [`Event`] into a [`Touchpoint`]. `user_id`/`session_id`
    /// default to the empty string when the source event omits them —
    /// journeys are keyed by caller-supplied user/app/session scope, not by
    /// this projection.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: event.event_id.clone(),
            app_id: event.app_id.clone(),
            user_id: event.user_id.clone().unwrap_or_default(),
            session_id: event.session_id.clone().unwrap_or_default(),
            event_type: event.event_type,
            timestamp: event.timestamp,
            campaign_id: event.campaign_id.clone(),
            ad_group_id: event.ad_group_id.clone(),
            creative_id: event.creative_id.clone(),
            network_id: event.network_id.clone(),
            platform: event.platform,
            revenue: event.revenue.unwrap_or(0.0),
            currency: event.currency.clone(),
            metadata: event.custom_params.clone(),
        }
    }
}

/// An ordered sequence of touchpoints for one user/app/session scope,
/// terminated by a conversion touchpoint.
///
/// Invariants (checked by [`Journey::new`]): at least one touchpoint;
/// `conversion.timestamp >= max(touchpoint.timestamp)`; `journey_end ==
/// conversion.timestamp`; `total_revenue == conversion.revenue` unless the
/// caller supplies a distinct total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub user_id: String,
    pub app_id: String,
    pub session_id: String,
    pub touchpoints: Vec<Touchpoint>,
    pub conversion: Touchpoint,
    pub journey_start: i64,
    pub journey_end: i64,
    pub total_revenue: f64,
}

/// Reasons a caller-assembled journey fails its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JourneyError {
    #[error("journey must contain at least one touchpoint")]
    Empty,
    #[error("conversion timestamp {conversion} precedes touchpoint timestamp {touchpoint}")]
    ConversionBeforeTouchpoint { conversion: i64, touchpoint: i64 },
}

impl Journey {
    /// Build a journey from its touchpoints and conversion, deriving
    /// `journey_start`/`journey_end`/`total_revenue` when not overridden.
    pub fn new(
        user_id: impl Into<String>,
        app_id: impl Into<String>,
        session_id: impl Into<String>,
        touchpoints: Vec<Touchpoint>,
        conversion: Touchpoint,
        total_revenue: Option<f64>,
    ) -> Result<Self, JourneyError> {
        if touchpoints.is_empty() {
            return Err(JourneyError::Empty);
        }
        if let Some(max_ts) = touchpoints.iter().map(|t| t.timestamp).max() {
            if conversion.timestamp < max_ts {
                return Err(JourneyError::ConversionBeforeTouchpoint {
                    conversion: conversion.timestamp,
                    touchpoint: max_ts,
                });
            }
        }
        let journey_start = touchpoints
            .iter()
            .map(|t| t.timestamp)
            .min()
            .unwrap_or(conversion.timestamp);
        let journey_end = conversion.timestamp;
        let total_revenue = total_revenue.unwrap_or(conversion.revenue);

        Ok(Self {
            user_id: user_id.into(),
            app_id: app_id.into(),
            session_id: session_id.into(),
            touchpoints,
            conversion,
            journey_start,
            journey_end,
            total_revenue,
        })
    }
}
