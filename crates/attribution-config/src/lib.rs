//! # Attribution Config
//!
//! Environment-driven configuration for the attribution platform.
//!
//! This crate provides:
//! - Environment variable loading via `dotenvy`
//! - Typed settings for the server, cache façade, ingestion pipeline, and
//!   analytics store

pub mod settings;

pub use settings::{
    AnalyticsStoreSettings, CacheSettings, IngestionSettings, ServerSettings, Settings,
};
