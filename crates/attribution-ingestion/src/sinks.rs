//! Dispatch targets for a validated, enriched batch (§4.3).
//!
//! Grounded on `examples/original_source/attribution/services/ingestion/pkg/kafka/producer.go`
//! (`MessageBusSink`, `SendBatch`/`SendEvent`) and
//! `examples/original_source/attribution/services/ingestion/pkg/clickhouse/client.go`
//! (`AnalyticsSink`, `InsertBatch`/`InsertEvent`) — both of which are
//! themselves unimplemented stubs in the source, so there is no real
//! persistence logic to port. `DeadLetterSink` has no source analogue; it
//! exists so a batch that exhausts retries has somewhere defined to land.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use attribution_core::{CoreError, Event};

/// Durable analytics storage (the column-store write path).
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn write_batch(&self, events: &[Event]) -> Result<(), CoreError>;
}

/// Downstream message bus fan-out (other consumers of the raw event stream).
#[async_trait]
pub trait MessageBusSink: Send + Sync {
    async fn publish_batch(&self, events: &[Event]) -> Result<(), CoreError>;
}

/// Where a batch goes once every sink attempt for it has been exhausted.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn record(&self, events: &[Event], reason: &str);
}

/// In-memory `AnalyticsSink` for tests: records every batch it's handed.
#[derive(Default)]
pub struct InMemoryAnalyticsSink {
    written: Mutex<Vec<Event>>,
}

impl InMemoryAnalyticsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn written_count(&self) -> usize {
        self.written.lock().expect("analytics sink lock poisoned").len()
    }
}

#[async_trait]
impl AnalyticsSink for InMemoryAnalyticsSink {
    async fn write_batch(&self, events: &[Event]) -> Result<(), CoreError> {
        self.written
            .lock()
            .expect("analytics sink lock poisoned")
            .extend_from_slice(events);
        Ok(())
    }
}

/// In-memory `MessageBusSink` for tests: records every batch it's handed.
#[derive(Default)]
pub struct InMemoryMessageBusSink {
    published: Mutex<Vec<Event>>,
}

impl InMemoryMessageBusSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn published_count(&self) -> usize {
        self.published
            .lock()
            .expect("message bus sink lock poisoned")
            .len()
    }
}

#[async_trait]
impl MessageBusSink for InMemoryMessageBusSink {
    async fn publish_batch(&self, events: &[Event]) -> Result<(), CoreError> {
        self.published
            .lock()
            .expect("message bus sink lock poisoned")
            .extend_from_slice(events);
        Ok(())
    }
}

/// Default dead-letter target: drops the batch and counts it. Production
/// deployments swap in a sink that persists `(events, reason)` somewhere a
/// human can look later; nothing in this spec defines that store.
#[derive(Default)]
pub struct NullDeadLetterSink {
    dropped_batches: AtomicUsize,
}

impl NullDeadLetterSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dropped_batches(&self) -> usize {
        self.dropped_batches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeadLetterSink for NullDeadLetterSink {
    async fn record(&self, events: &[Event], reason: &str) {
        self.dropped_batches.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            batch_size = events.len(),
            reason,
            "batch dead-lettered after exhausting retries"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution_core::{EventKind, Platform};
    use std::collections::HashMap;

    fn event(id: &str) -> Event {
        Event {
            event_id: id.into(),
            app_id: "app1".into(),
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

    #[tokio::test]
    async fn in_memory_analytics_sink_records_batches() {
        let sink = InMemoryAnalyticsSink::new();
        sink.write_batch(&[event("e1"), event("e2")]).await.unwrap();
        assert_eq!(sink.written_count(), 2);
    }

    #[tokio::test]
    async fn in_memory_message_bus_sink_records_batches() {
        let sink = InMemoryMessageBusSink::new();
        sink.publish_batch(&[event("e1")]).await.unwrap();
        assert_eq!(sink.published_count(), 1);
    }

    #[tokio::test]
    async fn null_dead_letter_sink_counts_drops() {
        let sink = NullDeadLetterSink::new();
        sink.record(&[event("e1")], "sink unavailable").await;
        sink.record(&[event("e2")], "sink unavailable").await;
        assert_eq!(sink.dropped_batches(), 2);
    }
}
