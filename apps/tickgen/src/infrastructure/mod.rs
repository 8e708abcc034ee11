//! Infrastructure Layer
//!
//! Adapters and external integrations.

/// Environment-driven settings.
pub mod config;

/// Batching HTTP append sink.
pub mod http;

/// Throughput reporting.
pub mod stats;

/// Tracing subscriber setup.
pub mod telemetry;
