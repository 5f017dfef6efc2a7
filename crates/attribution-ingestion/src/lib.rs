//! # Attribution Ingestion
//!
//! The event intake pipeline (§4.3): a bounded channel at the HTTP boundary,
//! an aggregator that batches by size or time, and a worker pool that
//! validates, enriches, dispatches to sinks, and invalidates affected cache
//! entries.
//!
//! Grounded on `examples/original_source/attribution/services/ingestion/main.go`.

pub mod pipeline;
pub mod retry;
pub mod sinks;

pub use pipeline::{IngestionMetrics, IngestionPipeline};
pub use sinks::{
    AnalyticsSink, DeadLetterSink, InMemoryAnalyticsSink, InMemoryMessageBusSink, MessageBusSink,
    NullDeadLetterSink,
};
