//! Tracing Setup
//!
//! Configures the `tracing` subscriber for structured log output.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (default: `info`)
//!
//! # Usage
//!
//! ```ignore
//! tickgen::infrastructure::telemetry::init();
//! tracing::info!("starting");
//! ```

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber.
///
/// Idempotent: repeated calls (as happens across tests) leave the first
/// subscriber in place.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
