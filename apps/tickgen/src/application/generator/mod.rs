//! Tick Generator
//!
//! Batch scheduler and lifecycle for the synthetic tick stream. A single
//! dedicated task runs a fixed-cadence timer; each firing computes how many
//! ticks to emit to approximate the target average rate, draws that many
//! symbol/quote pairs from the stochastic walk, and hands each tick to the
//! caller's callback synchronously before moving on.
//!
//! The cadence is `max(100ms, target_interval)`: firing more often than
//! 100ms would spend the run in timer overhead at high target rates, and
//! firing less often than the target would under-batch. Sub-cadence rates
//! are reached by emitting batches; the fractional part of
//! `cadence / target_interval` is rounded stochastically so the long-run
//! average converges to the target exactly.
//!
//! Shutdown is cooperative: `stop()` trips a one-shot token observed only
//! between ticks, so a batch in progress always completes. Any number of
//! concurrent `stop()` calls converge to one teardown.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::tick::Tick;
use crate::domain::walk::SymbolState;

/// Minimum timer firing period. Rates above `1 / TICK_CADENCE_FLOOR` are
/// produced by batching within each firing.
pub const TICK_CADENCE_FLOOR: Duration = Duration::from_millis(100);

/// Substituted when the configured target interval is zero.
const DEFAULT_TARGET_INTERVAL: Duration = Duration::from_secs(1);

/// How each slot within a batch gets its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Distribute slot timestamps across the tick window, ending at the
    /// tick-fire time: slot `i` stamps `fire_time - cadence + i * target`.
    SpreadWithinTick,
    /// Stamp every slot at the tick-fire time plus its slot index in
    /// nanoseconds. Sub-resolution ordering only, not a real distribution.
    #[default]
    TickPlusOffset,
}

impl TimestampPolicy {
    /// Parse a policy name from configuration.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "spread" | "spread-within-tick" => Self::SpreadWithinTick,
            _ => Self::TickPlusOffset,
        }
    }

    /// Get the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SpreadWithinTick => "spread",
            Self::TickPlusOffset => "offset",
        }
    }
}

/// Generator configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Symbol codes to simulate. An empty set makes `start` a no-op.
    pub codes: Vec<String>,
    /// Desired average time between emitted ticks, globally.
    pub target_interval: Duration,
    /// Timestamp assignment policy.
    pub timestamp_policy: TimestampPolicy,
    /// RNG seed. `None` seeds from the OS; identical seeds and configs
    /// reproduce identical tick sequences.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            codes: Vec::new(),
            target_interval: DEFAULT_TARGET_INTERVAL,
            timestamp_policy: TimestampPolicy::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration. A zero `target_interval` is substituted with
    /// one second.
    #[must_use]
    pub fn new(codes: Vec<String>, target_interval: Duration) -> Self {
        let target_interval = if target_interval.is_zero() {
            DEFAULT_TARGET_INTERVAL
        } else {
            target_interval
        };
        Self {
            codes,
            target_interval,
            ..Self::default()
        }
    }

    /// Set the timestamp policy.
    #[must_use]
    pub const fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Set the RNG seed for reproducible runs.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Actual timer firing period for this configuration.
    #[must_use]
    pub fn tick_cadence(&self) -> Duration {
        self.target_interval.max(TICK_CADENCE_FLOOR)
    }
}

/// Synthetic tick generator with a cooperative, idempotent stop.
///
/// Single-use: once stopped, `start` returns `None`. Calling `start` twice
/// on a running instance is not guarded and spawns a second loop.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use tickgen::{GeneratorConfig, TickGenerator};
///
/// async fn example() {
///     let config = GeneratorConfig::new(
///         vec!["AAPL".into(), "GOOG".into(), "MSFT".into()],
///         Duration::from_micros(500),
///     );
///     let generator = TickGenerator::new(config);
///     let handle = generator.start(|tick| println!("{tick:?}"));
///
///     tokio::time::sleep(Duration::from_secs(10)).await;
///     generator.stop();
///     if let Some(handle) = handle {
///         let _ = handle.await;
///     }
/// }
/// ```
#[derive(Debug)]
pub struct TickGenerator {
    config: GeneratorConfig,
    cancel: CancellationToken,
}

impl TickGenerator {
    /// Create a generator from a configuration.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let mut config = config;
        if config.target_interval.is_zero() {
            config.target_interval = DEFAULT_TARGET_INTERVAL;
        }
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// The configuration this generator runs with.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Spawn the scheduler loop on a dedicated task.
    ///
    /// Returns `None` without side effects when the code set is empty or the
    /// generator was already stopped (fail-quiet, this is a best-effort load
    /// tool). The callback runs in-line on the generator task: a slow sink
    /// throttles emission directly.
    pub fn start<F>(&self, callback: F) -> Option<tokio::task::JoinHandle<()>>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        if self.config.codes.is_empty() {
            tracing::debug!("tick generator not started: empty code set");
            return None;
        }
        if self.cancel.is_cancelled() {
            tracing::debug!("tick generator not started: already stopped");
            return None;
        }
        let config = self.config.clone();
        let cancel = self.cancel.clone();
        Some(tokio::spawn(scheduler_loop(config, cancel, callback)))
    }

    /// Run the scheduler loop on the calling task until stopped.
    ///
    /// Same contract as [`start`](Self::start), for callers that prefer to
    /// block instead of spawning.
    pub async fn run<F>(&self, callback: F)
    where
        F: FnMut(Tick) + Send,
    {
        if self.config.codes.is_empty() || self.cancel.is_cancelled() {
            return;
        }
        scheduler_loop(self.config.clone(), self.cancel.clone(), callback).await;
    }

    /// Stop the generator.
    ///
    /// Idempotent and safe from any task; every call after the first is a
    /// no-op. The loop observes the signal between ticks, so a batch in
    /// flight completes before the task exits.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// True once `stop` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// The scheduler loop: one timer, one batch per firing.
async fn scheduler_loop<F>(config: GeneratorConfig, cancel: CancellationToken, mut callback: F)
where
    F: FnMut(Tick),
{
    let target = config.target_interval;
    let cadence = config.tick_cadence();

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    // Eager state init in code order keeps seeded runs reproducible.
    let mut states: HashMap<String, SymbolState> = HashMap::with_capacity(config.codes.len());
    for code in &config.codes {
        states.insert(code.clone(), SymbolState::seeded(&mut rng));
    }

    tracing::debug!(
        codes = config.codes.len(),
        target_us = target.as_micros() as u64,
        cadence_ms = cadence.as_millis() as u64,
        policy = config.timestamp_policy.as_str(),
        "tick generator running"
    );

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + cadence, cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("tick generator stopped");
                break;
            }
            _ = interval.tick() => {
                let fire_time = Utc::now();
                let count = batch_count(cadence, target, &mut rng);

                for slot in 0..count {
                    let idx = rng.random_range(0..config.codes.len());
                    let code = &config.codes[idx];
                    let state = states
                        .entry(code.clone())
                        .or_insert_with(|| SymbolState::seeded(&mut rng));

                    let dt = randomized_interval(&mut rng, target).as_secs_f64();
                    let quote = state.advance(dt, &mut rng);
                    let timestamp =
                        slot_timestamp(config.timestamp_policy, fire_time, cadence, target, slot);

                    callback(Tick {
                        timestamp,
                        code: code.clone(),
                        price: quote.price,
                        volume: quote.volume,
                        bid_price: quote.bid,
                        ask_price: quote.ask,
                    });
                }
            }
        }
    }
}

/// Ticks to emit this firing.
///
/// `floor(cadence / target)` plus one with probability equal to the
/// fractional remainder; the stochastic rounding is what makes the long-run
/// average rate converge to the target despite integer truncation per tick.
/// Never less than one.
fn batch_count<R: Rng>(cadence: Duration, target: Duration, rng: &mut R) -> u64 {
    let cadence_ns = cadence.as_nanos();
    let target_ns = target.as_nanos().max(1);

    let mut count = (cadence_ns / target_ns) as u64;
    let remainder = (cadence_ns % target_ns) as f64 / target_ns as f64;
    if rng.random::<f64>() < remainder {
        count += 1;
    }
    count.max(1)
}

/// Draw the per-slot elapsed time: `base ± base/4`, uniform.
///
/// Returns zero for a zero base, and the base unchanged when it is too small
/// to jitter.
pub fn randomized_interval<R: Rng>(rng: &mut R, base: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let jitter = base / 4;
    if jitter.is_zero() {
        return base;
    }
    let span = jitter.as_nanos() as u64 * 2 + 1;
    let offset = rng.random_range(0..span);
    base - jitter + Duration::from_nanos(offset)
}

/// Timestamp for one slot of a batch.
fn slot_timestamp(
    policy: TimestampPolicy,
    fire_time: DateTime<Utc>,
    cadence: Duration,
    target: Duration,
    slot: u64,
) -> DateTime<Utc> {
    match policy {
        TimestampPolicy::TickPlusOffset => fire_time + chrono::Duration::nanoseconds(slot as i64),
        TimestampPolicy::SpreadWithinTick => {
            let cadence_ns = cadence.as_nanos() as i64;
            let offset_ns = (target.as_nanos() as i64)
                .saturating_mul(slot as i64)
                .min(cadence_ns);
            fire_time + chrono::Duration::nanoseconds(offset_ns - cadence_ns)
        }
    }
}
