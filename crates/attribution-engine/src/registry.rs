//! `AttributionEngine`: the model registry and the calculation entry point
//! (§4.4). Grounded on `engine.go`'s `AttributionEngine`/`RegisterModel`/
//! `Calculate`/`CalculateAll`/`GetMetrics`/`Stop`, generalized from a
//! `map[string]AttributionModel` guarded by `sync.RWMutex` to
//! `RwLock<HashMap<String, Arc<dyn AttributionModel>>>`, and from package
//! `log.Printf` to `tracing`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use attribution_core::{CoreError, Journey};
use dashmap::DashMap;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::models::{
    AttributionModel, FirstTouchModel, LastTouchModel, LinearModel, PositionBasedModel,
    TimeDecayModel,
};

#[derive(Default)]
struct EngineCounters {
    calculations_processed: AtomicU64,
    errors: AtomicU64,
    total_duration_nanos: AtomicU64,
}

/// A point-in-time snapshot of the engine's own bookkeeping (distinct from
/// the Prometheus-style vectors emitted per calculation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetrics {
    pub calculations_processed: u64,
    pub average_processing_time_ms: f64,
    pub error_rate: f64,
    pub models_usage: HashMap<String, u64>,
}

/// The attribution model registry. Read on every `calculate`, written only
/// on `register_model` (normally at startup), matching the reader/writer
/// lock discipline in §5.
pub struct AttributionEngine {
    models: RwLock<HashMap<String, Arc<dyn AttributionModel>>>,
    usage: DashMap<String, AtomicU64>,
    counters: EngineCounters,
}

impl AttributionEngine {
    /// Builds an engine pre-registered with the five default models, exactly
    /// as `NewAttributionEngine` does in the source.
    #[must_use]
    pub fn new() -> Self {
        let engine = Self {
            models: RwLock::new(HashMap::new()),
            usage: DashMap::new(),
            counters: EngineCounters::default(),
        };

        engine.register_model(Arc::new(FirstTouchModel));
        engine.register_model(Arc::new(LastTouchModel));
        engine.register_model(Arc::new(LinearModel));
        engine.register_model(Arc::new(TimeDecayModel::default()));
        engine.register_model(Arc::new(PositionBasedModel::default()));

        tracing::info!(model_count = 5, "attribution engine initialized");
        engine
    }

    /// Adds or replaces a model under its own `name()`.
    pub fn register_model(&self, model: Arc<dyn AttributionModel>) {
        let name = model.name();
        self.models
            .write()
            .expect("attribution model registry lock poisoned")
            .insert(name.to_string(), model);
        self.usage.entry(name.to_string()).or_insert_with(AtomicU64::default);
        tracing::info!(model = name, "registered attribution model");
    }

    /// Runs one named model over a journey, recording the full observability
    /// contract from §4.4 regardless of outcome.
    pub fn calculate(&self, journey: &Journey, model_name: &str) -> Result<attribution_core::AttributionResult, CoreError> {
        if journey.touchpoints.is_empty() {
            counter!(
                "attribution_calculations_total",
                "model" => model_name.to_string(),
                "app_id" => journey.app_id.clone(),
                "status" => "error"
            )
            .increment(1);
            return Err(CoreError::EmptyJourney);
        }

        let model = self
            .models
            .read()
            .expect("attribution model registry lock poisoned")
            .get(model_name)
            .cloned();

        let Some(model) = model else {
            counter!(
                "attribution_calculations_total",
                "model" => model_name.to_string(),
                "app_id" => journey.app_id.clone(),
                "status" => "error"
            )
            .increment(1);
            return Err(CoreError::UnknownModel(model_name.to_string()));
        };

        let start = Instant::now();
        let result = model.calculate(journey);
        let duration = start.elapsed();

        histogram!("attribution_calculation_duration_seconds", "model" => model_name.to_string())
            .record(duration.as_secs_f64());
        histogram!("attribution_journey_length", "app_id" => journey.app_id.clone())
            .record(journey.touchpoints.len() as f64);
        self.counters
            .total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        match result {
            Ok(result) => {
                counter!(
                    "attribution_calculations_total",
                    "model" => model_name.to_string(),
                    "app_id" => journey.app_id.clone(),
                    "status" => "success"
                )
                .increment(1);
                self.counters
                    .calculations_processed
                    .fetch_add(1, Ordering::Relaxed);
                self.usage
                    .entry(model_name.to_string())
                    .or_insert_with(AtomicU64::default)
                    .fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    model = model_name,
                    journey_length = journey.touchpoints.len(),
                    revenue = journey.total_revenue,
                    "attribution calculated"
                );
                Ok(result)
            }
            Err(err) => {
                counter!(
                    "attribution_calculations_total",
                    "model" => model_name.to_string(),
                    "app_id" => journey.app_id.clone(),
                    "status" => "error"
                )
                .increment(1);
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Runs every registered model over a journey. A model-specific error is
    /// logged and that model is skipped; the overall call only fails if the
    /// journey itself is invalid (empty).
    pub fn calculate_all(
        &self,
        journey: &Journey,
    ) -> Result<HashMap<String, attribution_core::AttributionResult>, CoreError> {
        if journey.touchpoints.is_empty() {
            return Err(CoreError::EmptyJourney);
        }

        let names = self.available_models();
        let mut results = HashMap::with_capacity(names.len());
        for name in names {
            match self.calculate(journey, &name) {
                Ok(result) => {
                    results.insert(name, result);
                }
                Err(err) => {
                    tracing::warn!(model = %name, error = %err, "attribution calculation failed");
                }
            }
        }
        Ok(results)
    }

    #[must_use]
    pub fn available_models(&self) -> Vec<String> {
        self.models
            .read()
            .expect("attribution model registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn metrics(&self) -> EngineMetrics {
        let calculations_processed = self.counters.calculations_processed.load(Ordering::Relaxed);
        let errors = self.counters.errors.load(Ordering::Relaxed);
        let total = calculations_processed + errors;

        let average_processing_time_ms = if calculations_processed == 0 {
            0.0
        } else {
            let total_nanos = self.counters.total_duration_nanos.load(Ordering::Relaxed);
            (total_nanos as f64 / calculations_processed as f64) / 1_000_000.0
        };
        let error_rate = if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        };

        let models_usage = self
            .usage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();

        EngineMetrics {
            calculations_processed,
            average_processing_time_ms,
            error_rate,
            models_usage,
        }
    }

    /// No background tasks to cancel; present for parity with the source's
    /// `Stop()` and for a uniform shutdown sequence in `attribution-api`.
    pub fn stop(&self) {
        tracing::info!("attribution engine stopped");
    }
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::new()
    }
}
