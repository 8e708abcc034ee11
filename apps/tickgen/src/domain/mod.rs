//! Domain Layer
//!
//! Pure types and math with no I/O dependencies.

/// Tick record handed to sinks.
pub mod tick;

/// Per-symbol stochastic state and the price/volume model.
pub mod walk;
