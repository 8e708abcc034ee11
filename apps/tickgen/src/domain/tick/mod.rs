//! Tick Record
//!
//! The immutable value produced per emission. Ownership passes to the sink
//! callback; the generator keeps no reference after emitting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single simulated market tick.
///
/// Invariants upheld by the generator for every emitted tick:
/// `price >= 1.0`, `volume >= 1.0`, `0.01 <= bid_price <= price <= ask_price`
/// and `ask_price > bid_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Emission timestamp (policy-dependent, see `TimestampPolicy`).
    pub timestamp: DateTime<Utc>,
    /// Symbol code this tick belongs to.
    pub code: String,
    /// Last simulated trade price.
    pub price: f64,
    /// Trade volume, correlated with the size of the price move.
    pub volume: f64,
    /// Best bid.
    pub bid_price: f64,
    /// Best ask.
    pub ask_price: f64,
}

impl Tick {
    /// Timestamp as nanoseconds since the Unix epoch.
    ///
    /// Saturates to zero outside the representable range; synthetic
    /// timestamps never get there in practice.
    #[must_use]
    pub fn epoch_nanos(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or_default()
    }

    /// Render as one CSV row for the database write endpoint.
    ///
    /// Column order matches the `stock_tick` tag table:
    /// `code,time,price,volume,bid_price,ask_price`.
    #[must_use]
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.code,
            self.epoch_nanos(),
            self.price,
            self.volume,
            self.bid_price,
            self.ask_price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_tick() -> Tick {
        Tick {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 27, 9, 30, 1).unwrap(),
            code: "AAPL".to_string(),
            price: 150.25,
            volume: 100.0,
            bid_price: 150.20,
            ask_price: 150.30,
        }
    }

    #[test]
    fn csv_row_column_order() {
        let tick = sample_tick();
        let row = tick.csv_row();
        let fields: Vec<&str> = row.split(',').collect();

        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], "AAPL");
        assert_eq!(fields[1], tick.epoch_nanos().to_string());
        assert_eq!(fields[2], "150.25");
        assert_eq!(fields[5], "150.3");
    }

    #[test]
    fn epoch_nanos_round_trip() {
        let tick = sample_tick();
        let nanos = tick.epoch_nanos();
        assert!(nanos > 0);
        assert_eq!(nanos % 1_000_000_000, 0, "whole-second fixture");
    }

    #[test]
    fn serde_round_trip() {
        let tick = sample_tick();
        let json = serde_json::to_string(&tick).unwrap();
        let back: Tick = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tick);
    }
}
