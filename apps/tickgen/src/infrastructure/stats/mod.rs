//! Throughput Reporting
//!
//! Atomic counters shared between the emission callback and a background
//! reporter task that logs the achieved rate at a fixed interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counters for emitted and dropped ticks.
#[derive(Debug, Default)]
pub struct EmissionCounter {
    emitted: AtomicU64,
    dropped: AtomicU64,
}

impl EmissionCounter {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully delivered tick.
    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one tick the sink refused.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total delivered ticks.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Total refused ticks.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Background task that logs throughput every `report_interval`.
///
/// Runs until the shared cancellation token trips.
pub struct ThroughputReporter {
    counter: Arc<EmissionCounter>,
    report_interval: Duration,
    cancel: CancellationToken,
}

impl ThroughputReporter {
    /// Default reporting period.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Create a new reporter.
    #[must_use]
    pub const fn new(
        counter: Arc<EmissionCounter>,
        report_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            counter,
            report_interval,
            cancel,
        }
    }

    /// Run the reporting loop until cancelled.
    pub async fn run(self) {
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.report_interval,
            self.report_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_total = self.counter.emitted();
        let mut last_at = Instant::now();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("throughput reporter stopped");
                    break;
                }
                _ = interval.tick() => {
                    let now = Instant::now();
                    let total = self.counter.emitted();
                    let dropped = self.counter.dropped();
                    let elapsed = now.duration_since(last_at).as_secs_f64();
                    let tps = if elapsed > 0.0 {
                        (total - last_total) as f64 / elapsed
                    } else {
                        0.0
                    };
                    last_total = total;
                    last_at = now;

                    tracing::info!(
                        tps = format_args!("{tps:.0}"),
                        total,
                        dropped,
                        "throughput"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_tracks_emitted_and_dropped() {
        let counter = EmissionCounter::new();
        assert_eq!(counter.emitted(), 0);
        assert_eq!(counter.dropped(), 0);

        for _ in 0..10 {
            counter.record_emitted();
        }
        counter.record_dropped();

        assert_eq!(counter.emitted(), 10);
        assert_eq!(counter.dropped(), 1);
    }

    #[tokio::test]
    async fn reporter_stops_on_cancel() {
        let counter = Arc::new(EmissionCounter::new());
        let cancel = CancellationToken::new();
        let reporter =
            ThroughputReporter::new(Arc::clone(&counter), Duration::from_secs(10), cancel.clone());

        let handle = tokio::spawn(reporter.run());
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("reporter should shut down on cancellation")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn reporter_survives_a_reporting_cycle() {
        let counter = Arc::new(EmissionCounter::new());
        let cancel = CancellationToken::new();
        let reporter =
            ThroughputReporter::new(Arc::clone(&counter), Duration::from_millis(20), cancel.clone());

        let handle = tokio::spawn(reporter.run());
        for _ in 0..100 {
            counter.record_emitted();
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("reporter should shut down")
            .expect("task should not panic");
    }
}
