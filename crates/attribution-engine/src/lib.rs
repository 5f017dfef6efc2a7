//! # Attribution Engine
//!
//! The multi-model attribution calculator (§4.4): a registry of pure,
//! deterministic `Journey -> AttributionResult` models plus the
//! bookkeeping (`Calculate`/`CalculateAll`/`RegisterModel`/
//! `AvailableModels`/`Metrics`/`Stop`) around it.
//!
//! Grounded on `examples/original_source/attribution/services/attribution/engine.go`.

pub mod models;
pub mod registry;

pub use models::{
    AttributionModel, FirstTouchModel, LastTouchModel, LinearModel, PositionBasedModel,
    TimeDecayModel,
};
pub use registry::{AttributionEngine, EngineMetrics};
