//! Port Interfaces
//!
//! Contracts between the generator and whatever persists its ticks,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`TickSink`]: accepts one tick per call; expected to batch/transmit to
//!   a persistence layer. A sink owns its buffering and retries; the
//!   generator never inspects sink outcomes. The integration policy for
//!   failures is log-and-drop: adapters report errors through [`SinkError`],
//!   callers log them and keep generating.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::tick::Tick;

/// Error type for sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink's internal queue is full; the tick was dropped.
    #[error("sink queue full, tick dropped")]
    Backlogged,
    /// The sink has been closed and accepts no more ticks.
    #[error("sink closed")]
    Closed,
    /// Transport-level failure while delivering a batch.
    #[error("sink transport error: {0}")]
    Transport(String),
}

/// Capability interface for tick persistence backends.
///
/// `append` must not block the caller for the duration of a network
/// round-trip; adapters buffer internally and deliver from their own task.
pub trait TickSink: Send + Sync {
    /// Accept one tick.
    fn append(&self, tick: Tick) -> Result<(), SinkError>;

    /// Push any buffered ticks toward the backend.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Signal that no more ticks will arrive. Idempotent.
    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that counts accepted ticks and otherwise discards them.
#[derive(Debug, Default)]
pub struct CountingSink {
    accepted: AtomicU64,
}

impl CountingSink {
    /// Create a new counting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks accepted so far.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

impl TickSink for CountingSink {
    fn append(&self, _tick: Tick) -> Result<(), SinkError> {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Sink that retains every tick in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct VecSink {
    ticks: Mutex<Vec<Tick>>,
}

impl VecSink {
    /// Create a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all ticks received so far.
    #[must_use]
    pub fn ticks(&self) -> Vec<Tick> {
        self.ticks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Number of ticks received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.lock().map(|t| t.len()).unwrap_or_default()
    }

    /// True when no ticks have been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TickSink for VecSink {
    fn append(&self, tick: Tick) -> Result<(), SinkError> {
        self.ticks.lock().map_err(|_| SinkError::Closed)?.push(tick);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tick(code: &str) -> Tick {
        Tick {
            timestamp: Utc::now(),
            code: code.to_string(),
            price: 100.0,
            volume: 10.0,
            bid_price: 99.95,
            ask_price: 100.05,
        }
    }

    #[test]
    fn counting_sink_counts() {
        let sink = CountingSink::new();
        assert_eq!(sink.accepted(), 0);
        for _ in 0..5 {
            sink.append(tick("AAA")).unwrap();
        }
        assert_eq!(sink.accepted(), 5);
    }

    #[test]
    fn vec_sink_retains_order() {
        let sink = VecSink::new();
        sink.append(tick("AAA")).unwrap();
        sink.append(tick("BBB")).unwrap();

        let ticks = sink.ticks();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].code, "AAA");
        assert_eq!(ticks[1].code, "BBB");
    }

    #[test]
    fn default_flush_and_close_are_noops() {
        let sink = CountingSink::new();
        assert!(sink.flush().is_ok());
        assert!(sink.close().is_ok());
        assert!(sink.close().is_ok());
    }
}
