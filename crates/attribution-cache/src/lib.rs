//! # Attribution Cache
//!
//! The key-prefixed cache façade (§4.2): `Get`/`Set`/`Delete`/
//! `InvalidatePattern`/`GetOrSet`/`SetMultiple`/`GetStats`/`WarmUp`/
//! `HealthCheck` over a [`KvStore`].
//!
//! Grounded on `examples/original_source/attribution/internal/cache/redis.go`
//! (method set and policy) and the teacher's `qa-pms-core/src/cache.rs`
//! (`moka::future::Cache` usage), generalized from typed per-purpose caches
//! to one opaque-bytes cache behind a trait.

pub mod facade;
pub mod keys;
pub mod store;

pub use facade::{CacheFacade, CacheOutcome, CacheStats};
pub use store::{KvStore, MokaStore, UnavailableStore};
