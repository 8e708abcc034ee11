//! Configuration
//!
//! All runtime configuration comes in through explicit settings values read
//! once at startup, never through ambient globals.

pub mod settings;

pub use settings::{ConfigError, DEFAULT_CODES, MAX_TARGET_INTERVAL, Settings, SinkKind};
