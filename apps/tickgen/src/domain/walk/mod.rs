//! Stochastic Price/Volume Walk
//!
//! Per-symbol mutable state plus the pure model that advances it: a random
//! shock scaled by volatility, a deterministic drift, a weak pull back to the
//! anchor price, and a volume term that spikes with large moves. All outputs
//! are clamped so no tick ever carries a non-finite or degenerate value.

use rand::Rng;
use rand_distr::StandardNormal;

/// Pull applied toward the anchor price on every advance. Keeps long runs
/// bounded instead of random-walking to absurd values.
const MEAN_REVERSION: f64 = 0.001;

/// Volume amplification per unit of absolute price move.
const VOLUME_SPIKE: f64 = 50.0;

/// Ranges used to seed fresh symbol states.
#[derive(Debug, Clone)]
pub struct SymbolStateConfig {
    /// Lower bound of the initial price range.
    pub price_base: f64,
    /// Width of the initial price range.
    pub price_span: f64,
    /// Lower bound of the base volume range.
    pub volume_base: f64,
    /// Width of the base volume range.
    pub volume_span: f64,
    /// Lower bound of the per-unit-time volatility range.
    pub volatility_base: f64,
    /// Width of the volatility range.
    pub volatility_span: f64,
    /// Half-width of the symmetric drift range.
    pub drift_span: f64,
}

impl Default for SymbolStateConfig {
    fn default() -> Self {
        Self {
            price_base: 50.0,
            price_span: 150.0,
            volume_base: 100.0,
            volume_span: 9000.0,
            volatility_base: 0.001,
            volatility_span: 0.01,
            drift_span: 0.0002,
        }
    }
}

/// One advance of the walk: the derived market quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// New simulated price.
    pub price: f64,
    /// Volume for this tick.
    pub volume: f64,
    /// Best bid.
    pub bid: f64,
    /// Best ask.
    pub ask: f64,
}

/// Mutable stochastic state for one symbol code.
///
/// Created on first reference (or eagerly at generator start) and mutated
/// exclusively by the scheduler task on every emission referencing the
/// symbol.
#[derive(Debug, Clone)]
pub struct SymbolState {
    /// Current simulated price.
    pub price: f64,
    /// Mean-reversion target, fixed at creation.
    pub anchor: f64,
    /// Baseline volume before spike/noise terms.
    pub base_volume: f64,
    /// Shock scale per unit time.
    pub volatility: f64,
    /// Deterministic trend per unit time.
    pub drift: f64,
}

impl SymbolState {
    /// Seed a fresh state from the shared generator RNG.
    pub fn seeded<R: Rng>(rng: &mut R) -> Self {
        Self::seeded_with(rng, &SymbolStateConfig::default())
    }

    /// Seed a fresh state with explicit ranges.
    pub fn seeded_with<R: Rng>(rng: &mut R, config: &SymbolStateConfig) -> Self {
        let base_price = config.price_base + rng.random::<f64>() * config.price_span;
        Self {
            price: base_price,
            anchor: base_price,
            base_volume: config.volume_base + rng.random::<f64>() * config.volume_span,
            volatility: config.volatility_base + rng.random::<f64>() * config.volatility_span,
            drift: (rng.random::<f64>() - 0.5) * 2.0 * config.drift_span,
        }
    }

    /// Advance the walk by `dt_secs` seconds and derive the next quote.
    ///
    /// A non-positive `dt_secs` is substituted with one second; the clamps
    /// below are correctness invariants, not recoverable errors.
    pub fn advance<R: Rng>(&mut self, dt_secs: f64, rng: &mut R) -> Quote {
        let dt = if dt_secs <= 0.0 { 1.0 } else { dt_secs };

        let shock: f64 = rng.sample::<f64, _>(StandardNormal) * self.volatility * dt.sqrt();
        let price_move = shock + self.drift * dt;

        let mut price = self.price * (1.0 + price_move);
        price += (self.anchor - price) * MEAN_REVERSION;
        if price < 1.0 {
            price = 1.0;
        }
        self.price = price;

        let mut volume =
            self.base_volume * (1.0 + price_move.abs() * VOLUME_SPIKE + rng.random::<f64>() * 0.2);
        if volume < 1.0 {
            volume = 1.0;
        }

        let spread_pct = 0.0005 + rng.random::<f64>() * 0.0015;
        let spread = price * spread_pct;
        let bid = (price - spread / 2.0).max(0.01);
        let ask = price + spread / 2.0;

        Quote {
            price,
            volume,
            bid,
            ask,
        }
    }
}
