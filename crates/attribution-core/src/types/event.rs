//! Event: the ingestion unit submitted at the HTTP boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed set of event kinds. Unknown values fail to deserialize rather than
/// being coerced, which is how malformed/quarantined events are rejected
/// before they ever reach the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Install,
    Click,
    Impression,
    Conversion,
    Session,
    Custom,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Click => "click",
            Self::Impression => "impression",
            Self::Conversion => "conversion",
            Self::Session => "session",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of originating platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A touchpoint/conversion event as received at the HTTP boundary.
///
/// Invariants enforced by [`Event::validate`]: `event_id`, `app_id`, `kind`,
/// and `platform` are non-empty; `timestamp`, if zero, is stamped with server
/// wall time by [`Event::enrich`]; `revenue`, if present, is `>= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    pub app_id: String,
    pub event_type: EventKind,
    /// Milliseconds since epoch. Zero means "stamp on arrival".
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idfa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaid: Option<String>,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_params: HashMap<String, serde_json::Value>,
}

/// A single reason an [`Event`] failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventValidationError {
    #[error("event_id is required")]
    MissingEventId,
    #[error("app_id is required")]
    MissingAppId,
    #[error("revenue must be >= 0, got {0}")]
    NegativeRevenue(String),
    #[error("currency must be a 3-letter ISO 4217 code, got {0:?}")]
    InvalidCurrency(String),
}

impl Event {
    /// Validate the invariants from §3. Does not mutate; call
    /// [`Event::enrich`] first if the caller wants zero timestamps stamped
    /// before validation runs.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.event_id.trim().is_empty() {
            return Err(EventValidationError::MissingEventId);
        }
        if self.app_id.trim().is_empty() {
            return Err(EventValidationError::MissingAppId);
        }
        if let Some(revenue) = self.revenue {
            if revenue < 0.0 {
                return Err(EventValidationError::NegativeRevenue(revenue.to_string()));
            }
        }
        if let Some(currency) = &self.currency {
            let is_valid = currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase());
            if !currency.is_empty() && !is_valid {
                return Err(EventValidationError::InvalidCurrency(currency.clone()));
            }
        }
        Ok(())
    }

    /// Stamp server wall time when `timestamp` is absent (zero), and assign
    /// an event id of the form `evt_<nanos>_<index>` when `event_id` is
    /// empty. `now_millis` and `index` are supplied by the caller so this
    /// stays a pure function (no hidden clock read), matching the engine's
    /// determinism requirement for everything downstream.
    pub fn enrich(&mut self, now_millis: i64, index: usize) {
        if self.timestamp == 0 {
            self.timestamp = now_millis;
        }
        if self.event_id.trim().is_empty() {
            self.event_id = format!("evt_{now_millis}_{index}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Event {
        Event {
            event_id: "evt_1".into(),
            app_id: "com.example.app".into(),
            event_type: EventKind::Click,
            timestamp: 1_700_000_000_000,
            user_id: None,
            session_id: None,
            device_id: None,
            idfa: None,
            gaid: None,
            platform: Platform::Ios,
            country: None,
            language: None,
            campaign_id: None,
            ad_group_id: None,
            creative_id: None,
            network_id: None,
            channel: None,
            source: None,
            medium: None,
            revenue: None,
            currency: None,
            custom_params: HashMap::new(),
        }
    }

    #[test]
    fn validates_clean_event() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_missing_event_id() {
        let mut e = sample();
        e.event_id.clear();
        assert_eq!(e.validate(), Err(EventValidationError::MissingEventId));
    }

    #[test]
    fn rejects_negative_revenue() {
        let mut e = sample();
        e.revenue = Some(-1.0);
        assert!(matches!(
            e.validate(),
            Err(EventValidationError::NegativeRevenue(_))
        ));
    }

    #[test]
    fn enrich_stamps_zero_timestamp_and_id() {
        let mut e = sample();
        e.timestamp = 0;
        e.event_id.clear();
        e.enrich(1_700_000_000_123, 7);
        assert_eq!(e.timestamp, 1_700_000_000_123);
        assert_eq!(e.event_id, "evt_1700000000123_7");
    }

    #[test]
    fn enrich_leaves_present_fields_untouched() {
        let mut e = sample();
        e.enrich(999, 0);
        assert_eq!(e.timestamp, 1_700_000_000_000);
        assert_eq!(e.event_id, "evt_1");
    }

    #[test]
    fn unknown_event_kind_fails_to_deserialize() {
        let json = r#"{"eventId":"e","appId":"a","eventType":"not_a_kind","platform":"ios"}"#;
        let result: Result<Event, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
