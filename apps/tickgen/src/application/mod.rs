//! Application Layer
//!
//! The generator service and the port contracts infrastructure adapters
//! implement.

/// Batch scheduler and generator lifecycle.
pub mod generator;

/// Port interfaces (sinks).
pub mod ports;
