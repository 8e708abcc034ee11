//! Tick Generator Binary
//!
//! Emits a synthetic market-tick stream at a configured rate until
//! interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tickgen
//! ```
//!
//! # Environment Variables
//!
//! - `TICKGEN_TPS`: target ticks per second (default: 1000)
//! - `TICKGEN_CODES`: comma-separated symbol codes
//! - `TICKGEN_CODES_FILE`: newline-separated codes file
//! - `TICKGEN_TIMESTAMP_POLICY`: spread | offset (default: offset)
//! - `TICKGEN_SEED`: RNG seed for reproducible runs
//! - `TICKGEN_SINK`: log | http (default: log)
//! - `TICKGEN_WRITE_URL`: database HTTP base URL (default: <http://127.0.0.1:5654>)
//! - `TICKGEN_TABLE`: target tag table (default: stock_tick)
//! - `TICKGEN_FLUSH_ROWS`: rows per HTTP batch (default: 1000)
//! - `TICKGEN_FLUSH_MS`: max milliseconds between batches (default: 1000)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use tickgen::application::ports::{SinkError, TickSink};
use tickgen::domain::tick::Tick;
use tickgen::infrastructure::config::{Settings, SinkKind};
use tickgen::infrastructure::http::{HttpSink, HttpSinkConfig};
use tickgen::infrastructure::stats::{EmissionCounter, ThroughputReporter};
use tickgen::infrastructure::telemetry;
use tickgen::TickGenerator;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Grace period for the generator task to wind down after stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink that logs each tick instead of persisting it.
struct LogSink;

impl TickSink for LogSink {
    fn append(&self, tick: Tick) -> Result<(), SinkError> {
        tracing::debug!(
            code = %tick.code,
            price = tick.price,
            volume = tick.volume,
            bid = tick.bid_price,
            ask = tick.ask_price,
            ts = %tick.timestamp,
            "tick"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    tracing::info!("Starting tick generator");

    let settings = Settings::from_env()?;
    log_config(&settings);

    let counter = Arc::new(EmissionCounter::new());
    let reporter_cancel = CancellationToken::new();
    let reporter = ThroughputReporter::new(
        Arc::clone(&counter),
        ThroughputReporter::DEFAULT_INTERVAL,
        reporter_cancel.clone(),
    );
    let reporter_handle = tokio::spawn(reporter.run());

    let http_sink = match settings.sink {
        SinkKind::Http => Some(Arc::new(HttpSink::new(HttpSinkConfig {
            write_url: settings.write_url.clone(),
            table: settings.table.clone(),
            flush_rows: settings.flush_rows,
            flush_interval: settings.flush_interval,
            ..Default::default()
        }))),
        SinkKind::Log => None,
    };
    let sink: Arc<dyn TickSink> = match &http_sink {
        Some(http) => Arc::clone(http) as Arc<dyn TickSink>,
        None => Arc::new(LogSink),
    };

    let generator = Arc::new(TickGenerator::new(settings.generator_config()));

    let callback_counter = Arc::clone(&counter);
    let callback_sink = Arc::clone(&sink);
    let handle = generator.start(move |tick| match callback_sink.append(tick) {
        Ok(()) => callback_counter.record_emitted(),
        Err(e) => {
            callback_counter.record_dropped();
            tracing::debug!(error = %e, "tick dropped");
        }
    });

    let Some(handle) = handle else {
        anyhow::bail!("generator did not start: no symbol codes configured");
    };

    shutdown_signal().await;

    generator.stop();
    if tokio::time::timeout(STOP_TIMEOUT, handle).await.is_err() {
        tracing::warn!("generator task did not stop within the grace period");
    }

    if let Some(http) = &http_sink {
        http.shutdown().await;
        if http.dropped() > 0 {
            tracing::warn!(dropped = http.dropped(), "rows lost to sink failures");
        }
    }

    reporter_cancel.cancel();
    let _ = reporter_handle.await;

    tracing::info!(
        emitted = counter.emitted(),
        dropped = counter.dropped(),
        "Tick generator stopped"
    );
    Ok(())
}

/// Log the active configuration at startup.
fn log_config(settings: &Settings) {
    tracing::info!(
        tps = settings.tps,
        codes = settings.codes.len(),
        policy = settings.timestamp_policy.as_str(),
        seed = ?settings.seed,
        sink = settings.sink.as_str(),
        "Configuration loaded"
    );
    if settings.sink == SinkKind::Http {
        tracing::info!(
            write_url = %settings.write_url,
            table = %settings.table,
            flush_rows = settings.flush_rows,
            flush_ms = settings.flush_interval.as_millis(),
            "HTTP sink configured"
        );
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. Failure to install
/// handlers means the process cannot respond to termination signals, so
/// failing fast at startup beats an unresponsive process.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
