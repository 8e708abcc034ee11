#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Tickgen - Synthetic Market Tick Generator
//!
//! Simulates a continuous stream of realistic per-symbol price/volume/bid/ask
//! ticks at a configurable target rate, using a mean-reverting stochastic
//! price walk, and delivers each tick to a pluggable sink (structured logging
//! or a machbase-neo style HTTP write endpoint).
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure data types and math, no I/O
//!   - `tick`: The tick record handed to sinks
//!   - `walk`: Per-symbol stochastic state and the price/volume model
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The sink interface adapters must implement
//!   - `generator`: Batch scheduler and generator lifecycle
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `config`: Environment-driven settings
//!   - `http`: Batching HTTP append sink
//!   - `stats`: Throughput reporting
//!   - `telemetry`: Tracing subscriber setup
//!
//! # Data Flow
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────────────┐
//! │  Generator  │────▶│   callback   │────▶│  Sink (log / HTTP)  │───▶ DB
//! │  (1 task)   │     │  (in-line)   │     └─────────────────────┘
//! └─────────────┘     └──────────────┘
//! ```
//!
//! A slow sink throttles the generator directly: emission is synchronous
//! within the generator task and there is no internal queue between them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure tick types and the stochastic model.
pub mod domain;

/// Application layer - Generator service and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::tick::Tick;
pub use domain::walk::{SymbolState, SymbolStateConfig};

// Application types
pub use application::generator::{
    GeneratorConfig, TickGenerator, TimestampPolicy, randomized_interval,
};
pub use application::ports::{CountingSink, SinkError, TickSink, VecSink};

// Infrastructure types
pub use infrastructure::config::{Settings, SinkKind};
pub use infrastructure::http::{HttpSink, HttpSinkConfig};
pub use infrastructure::stats::{EmissionCounter, ThroughputReporter};
