//! Generator Settings
//!
//! Configuration types for the tick generator binary, loaded from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `TICKGEN_TPS`: target ticks per second across all codes (default: 1000)
//! - `TICKGEN_CODES`: comma-separated symbol codes
//! - `TICKGEN_CODES_FILE`: newline-separated codes file (used when
//!   `TICKGEN_CODES` is unset; falls back to a built-in list)
//! - `TICKGEN_TIMESTAMP_POLICY`: `spread` | `offset` (default: offset)
//! - `TICKGEN_SEED`: RNG seed for reproducible runs (default: OS entropy)
//! - `TICKGEN_SINK`: `log` | `http` (default: log)
//! - `TICKGEN_WRITE_URL`: database HTTP base URL (default: <http://127.0.0.1:5654>)
//! - `TICKGEN_TABLE`: target tag table (default: stock_tick)
//! - `TICKGEN_FLUSH_ROWS`: rows per HTTP batch (default: 1000)
//! - `TICKGEN_FLUSH_MS`: max milliseconds between batches (default: 1000)

use std::str::FromStr;
use std::time::Duration;

use crate::application::generator::{GeneratorConfig, TimestampPolicy};

/// Built-in symbol codes, used when neither `TICKGEN_CODES` nor
/// `TICKGEN_CODES_FILE` is provided.
pub const DEFAULT_CODES: &[&str] = &[
    "AAPL", "MSFT", "GOOG", "AMZN", "NVDA", "META", "TSLA", "AVGO", "ORCL", "CRM", "AMD", "INTC",
    "QCOM", "TXN", "ADBE", "CSCO", "IBM", "NOW", "UBER", "SHOP", "JPM", "BAC", "WFC", "GS", "MS",
    "V", "MA", "AXP", "BRK", "BLK", "XOM", "CVX", "COP", "JNJ", "PFE", "MRK", "UNH", "LLY", "KO",
    "PEP",
];

/// Upper bound on the derived tick interval, one tick per hour. Guards the
/// `tps -> Duration` conversion against overflow at implausibly low rates.
pub const MAX_TARGET_INTERVAL: Duration = Duration::from_secs(3600);

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
    /// The codes file could not be read.
    #[error("cannot read codes file {path}: {source}")]
    CodesFile {
        /// File path from `TICKGEN_CODES_FILE`.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Which sink receives generated ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Log each tick at debug level and count it.
    #[default]
    Log,
    /// Batch ticks into CSV and POST them to the database write endpoint.
    Http,
}

impl SinkKind {
    /// Parse a sink kind from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "http" => Self::Http,
            _ => Self::Log,
        }
    }

    /// Get the sink kind name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Http => "http",
        }
    }
}

/// Runtime settings for the tick generator binary.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Target ticks per second across all codes.
    pub tps: f64,
    /// Symbol codes to simulate.
    pub codes: Vec<String>,
    /// Timestamp assignment policy.
    pub timestamp_policy: TimestampPolicy,
    /// RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Sink selection.
    pub sink: SinkKind,
    /// Database HTTP base URL.
    pub write_url: String,
    /// Target tag table name.
    pub table: String,
    /// Rows per HTTP batch.
    pub flush_rows: usize,
    /// Maximum time between HTTP batches.
    pub flush_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tps: 1000.0,
            codes: DEFAULT_CODES.iter().map(ToString::to_string).collect(),
            timestamp_policy: TimestampPolicy::default(),
            seed: None,
            sink: SinkKind::default(),
            write_url: "http://127.0.0.1:5654".to_string(),
            table: "stock_tick".to_string(),
            flush_rows: 1000,
            flush_interval: Duration::from_millis(1000),
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(tps) = env_parse::<f64>("TICKGEN_TPS")? {
            if tps <= 0.0 || !tps.is_finite() {
                return Err(ConfigError::InvalidValue {
                    var: "TICKGEN_TPS",
                    value: tps.to_string(),
                });
            }
            settings.tps = tps;
        }

        if let Ok(raw) = std::env::var("TICKGEN_CODES") {
            let codes = parse_codes(&raw);
            if !codes.is_empty() {
                settings.codes = codes;
            }
        } else if let Ok(path) = std::env::var("TICKGEN_CODES_FILE") {
            let raw = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::CodesFile { path, source })?;
            let codes = parse_codes(&raw);
            if !codes.is_empty() {
                settings.codes = codes;
            }
        }

        if let Ok(raw) = std::env::var("TICKGEN_TIMESTAMP_POLICY") {
            settings.timestamp_policy = TimestampPolicy::from_str_case_insensitive(&raw);
        }
        settings.seed = env_parse::<u64>("TICKGEN_SEED")?;
        if let Ok(raw) = std::env::var("TICKGEN_SINK") {
            settings.sink = SinkKind::from_str_case_insensitive(&raw);
        }
        if let Ok(url) = std::env::var("TICKGEN_WRITE_URL") {
            settings.write_url = url;
        }
        if let Ok(table) = std::env::var("TICKGEN_TABLE") {
            settings.table = table;
        }
        if let Some(rows) = env_parse::<usize>("TICKGEN_FLUSH_ROWS")? {
            settings.flush_rows = rows.max(1);
        }
        if let Some(ms) = env_parse::<u64>("TICKGEN_FLUSH_MS")? {
            settings.flush_interval = Duration::from_millis(ms.max(1));
        }

        Ok(settings)
    }

    /// Desired average time between emitted ticks.
    ///
    /// Capped at [`MAX_TARGET_INTERVAL`]: a TPS small enough to push the
    /// interval past the cap (or past what `Duration` can represent) is
    /// treated as one tick per cap period instead of panicking.
    #[must_use]
    pub fn target_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tps)
            .map_or(MAX_TARGET_INTERVAL, |d| d.min(MAX_TARGET_INTERVAL))
    }

    /// Build the generator configuration for these settings.
    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new(self.codes.clone(), self.target_interval())
            .with_timestamp_policy(self.timestamp_policy);
        config.seed = self.seed;
        config
    }
}

/// Split a comma- or newline-separated code list, dropping blanks.
fn parse_codes(raw: &str) -> Vec<String> {
    raw.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse an optional environment variable, erroring on malformed values.
fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(None),
    }
}
