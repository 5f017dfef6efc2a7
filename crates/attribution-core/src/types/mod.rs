//! Domain types shared across the attribution platform.
//!
//! JSON serialization uses `camelCase` via `#[serde(rename_all = "camelCase")]`,
//! matching the wire format described in the ingestion HTTP surface.

mod attribution;
mod envelope;
mod event;
mod journey;

pub use attribution::{AttributionData, AttributionResult};
pub use envelope::{ApiResponse, ResponseMeta};
pub use event::{Event, EventKind, EventValidationError, Platform};
pub use journey::{Journey, JourneyError, Touchpoint};
