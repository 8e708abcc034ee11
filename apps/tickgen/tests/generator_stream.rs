//! End-to-end tests for the tick generator stream.
//!
//! These drive a real generator task against wall-clock timers, so the
//! assertions use generous windows rather than exact counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tickgen::{GeneratorConfig, Tick, TickGenerator, TickSink, TimestampPolicy, VecSink};

/// Collect every emitted tick into a shared sink.
fn collecting_callback(sink: Arc<VecSink>) -> impl FnMut(Tick) + Send + 'static {
    move |tick| {
        let _ = sink.append(tick);
    }
}

/// A generated quote must respect the model's hard floors and ordering.
fn assert_valid(tick: &Tick) {
    assert!(!tick.code.is_empty());
    assert!(tick.epoch_nanos() > 0, "timestamp must be non-zero");
    assert!(tick.price >= 1.0, "price {} below floor", tick.price);
    assert!(tick.volume >= 1.0, "volume {} below floor", tick.volume);
    assert!(tick.bid_price >= 0.01, "bid {} below floor", tick.bid_price);
    assert!(
        tick.ask_price > tick.bid_price,
        "ask {} not above bid {}",
        tick.ask_price,
        tick.bid_price
    );
    assert!(tick.bid_price < tick.price && tick.price < tick.ask_price);
}

#[tokio::test]
async fn emits_valid_ticks_for_configured_codes() {
    let codes = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
    let config = GeneratorConfig::new(codes.clone(), Duration::from_millis(5));
    let generator = TickGenerator::new(config);

    let store = Arc::new(VecSink::new());
    let handle = generator
        .start(collecting_callback(Arc::clone(&store)))
        .expect("generator should start");

    tokio::time::sleep(Duration::from_millis(300)).await;
    generator.stop();
    handle.await.expect("task should not panic");

    let ticks = store.ticks();
    assert!(ticks.len() >= 5, "expected several ticks, got {}", ticks.len());
    for tick in &ticks {
        assert!(codes.contains(&tick.code), "unknown code {}", tick.code);
        assert_valid(tick);
    }
}

#[tokio::test]
async fn sub_cadence_target_reaches_rate_by_batching() {
    // 1ms target and a 100ms cadence means roughly 100 ticks per firing.
    let config = GeneratorConfig::new(vec!["AAA".to_string()], Duration::from_millis(1));
    let generator = TickGenerator::new(config);

    let count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&count);
    let handle = generator
        .start(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("generator should start");

    tokio::time::sleep(Duration::from_millis(250)).await;
    generator.stop();
    handle.await.expect("task should not panic");

    let emitted = count.load(Ordering::Relaxed);
    assert!(emitted >= 150, "expected at least 150 ticks, got {emitted}");
}

#[tokio::test]
async fn long_run_rate_converges_to_target() {
    // 2ms target over ~500ms should land near 250 emissions.
    let config = GeneratorConfig::new(
        vec!["AAA".to_string(), "BBB".to_string()],
        Duration::from_millis(2),
    );
    let generator = TickGenerator::new(config);

    let count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&count);
    let handle = generator
        .start(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("generator should start");

    tokio::time::sleep(Duration::from_millis(500)).await;
    generator.stop();
    handle.await.expect("task should not panic");

    let emitted = count.load(Ordering::Relaxed);
    assert!(
        (150..=350).contains(&emitted),
        "rate diverged from target: {emitted} ticks in 500ms at 2ms target"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_stops_converge_to_one_teardown() {
    let config = GeneratorConfig::new(vec!["AAA".to_string()], Duration::from_millis(5));
    let generator = Arc::new(TickGenerator::new(config));

    let handle = generator.start(|_| {}).expect("generator should start");

    let g1 = Arc::clone(&generator);
    let g2 = Arc::clone(&generator);
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { g1.stop() }),
        tokio::spawn(async move { g2.stop() }),
    );
    r1.expect("stop task should not panic");
    r2.expect("stop task should not panic");

    assert!(generator.is_stopped());
    tokio::time::timeout(Duration::from_millis(500), handle)
        .await
        .expect("loop should exit within one cadence")
        .expect("task should not panic");
}

#[tokio::test]
async fn seeded_runs_reproduce_the_same_stream() {
    let codes = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];

    let mut streams = Vec::new();
    for _ in 0..2 {
        let config = GeneratorConfig::new(codes.clone(), Duration::from_millis(2)).with_seed(42);
        let generator = TickGenerator::new(config);

        let store = Arc::new(VecSink::new());
        let handle = generator
            .start(collecting_callback(Arc::clone(&store)))
            .expect("generator should start");

        tokio::time::sleep(Duration::from_millis(250)).await;
        generator.stop();
        handle.await.expect("task should not panic");

        streams.push(store.ticks());
    }

    let (a, b) = (&streams[0], &streams[1]);
    let common = a.len().min(b.len());
    assert!(common >= 50, "too few ticks to compare: {common}");

    // Timestamps are wall clock; everything else must match tick for tick.
    for (x, y) in a.iter().zip(b.iter()).take(common) {
        assert_eq!(x.code, y.code);
        assert_eq!(x.price, y.price);
        assert_eq!(x.volume, y.volume);
        assert_eq!(x.bid_price, y.bid_price);
        assert_eq!(x.ask_price, y.ask_price);
    }
}

#[tokio::test]
async fn spread_policy_backdates_within_the_tick_window() {
    let config = GeneratorConfig::new(vec!["AAA".to_string()], Duration::from_millis(1))
        .with_timestamp_policy(TimestampPolicy::SpreadWithinTick);
    let generator = TickGenerator::new(config);

    let store = Arc::new(VecSink::new());
    let handle = generator
        .start(collecting_callback(Arc::clone(&store)))
        .expect("generator should start");

    let started = chrono::Utc::now();
    tokio::time::sleep(Duration::from_millis(250)).await;
    generator.stop();
    handle.await.expect("task should not panic");
    let finished = chrono::Utc::now();

    let ticks = store.ticks();
    assert!(!ticks.is_empty());
    let margin = chrono::Duration::milliseconds(150);
    for tick in &ticks {
        assert!(tick.timestamp >= started - margin, "timestamp too early");
        assert!(tick.timestamp <= finished, "timestamp in the future");
    }
}

#[tokio::test]
async fn empty_code_set_never_emits() {
    let generator = TickGenerator::new(GeneratorConfig::new(Vec::new(), Duration::from_millis(1)));
    assert!(generator.start(|_| panic!("no tick expected")).is_none());
}
