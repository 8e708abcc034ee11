//! HTTP Append Sink
//!
//! Batches ticks into CSV and POSTs them to a machbase-neo style write
//! endpoint (`/db/write/<table>?method=append`, `Content-Type: text/csv`).
//!
//! `append` never blocks the generator: ticks go into a bounded queue
//! drained by a dedicated writer task. Batches flush when they reach
//! `flush_rows` or when `flush_interval` elapses, whichever comes first.
//! A failed POST drops the batch and is logged; the sink keeps running
//! (log-and-drop policy, the dropped-row counter makes the loss visible).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{SinkError, TickSink};
use crate::domain::tick::Tick;

/// Configuration for the HTTP append sink.
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Database HTTP base URL, e.g. `http://127.0.0.1:5654`.
    pub write_url: String,
    /// Target tag table.
    pub table: String,
    /// Rows per batch before a size-triggered flush.
    pub flush_rows: usize,
    /// Maximum time a batch may sit before a time-triggered flush.
    pub flush_interval: Duration,
    /// Bounded queue capacity between `append` and the writer task.
    pub queue_capacity: usize,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            write_url: "http://127.0.0.1:5654".to_string(),
            table: "stock_tick".to_string(),
            flush_rows: 1000,
            flush_interval: Duration::from_millis(1000),
            queue_capacity: 65_536,
        }
    }
}

impl HttpSinkConfig {
    /// Full append endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/db/write/{}?method=append",
            self.write_url.trim_end_matches('/'),
            self.table
        )
    }
}

/// Batching sink that appends ticks over HTTP.
///
/// Must be created inside a tokio runtime; construction spawns the writer
/// task. Call [`shutdown`](Self::shutdown) to flush the remaining batch and
/// join the writer.
pub struct HttpSink {
    tx: mpsc::Sender<Tick>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
    writer: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HttpSink {
    /// Create the sink and spawn its writer task.
    #[must_use]
    pub fn new(config: HttpSinkConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicU64::new(0));

        let writer = tokio::spawn(writer_loop(
            config,
            rx,
            cancel.clone(),
            Arc::clone(&dropped),
        ));

        Self {
            tx,
            cancel,
            dropped,
            writer: std::sync::Mutex::new(Some(writer)),
        }
    }

    /// Rows lost to a full queue or failed POSTs.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Flush the remaining batch and stop the writer task. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.writer.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "http sink writer task failed");
            }
        }
    }
}

impl TickSink for HttpSink {
    fn append(&self, tick: Tick) -> Result<(), SinkError> {
        match self.tx.try_send(tick) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Backlogged)
            }
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }

    fn close(&self) -> Result<(), SinkError> {
        self.cancel.cancel();
        Ok(())
    }
}

/// Writer task: buffer rows, flush on size or interval, drain on shutdown.
async fn writer_loop(
    config: HttpSinkConfig,
    mut rx: mpsc::Receiver<Tick>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
) {
    let client = reqwest::Client::new();
    let endpoint = config.endpoint();
    let mut batch = Batch::new(config.flush_rows);

    let mut flush_timer = tokio::time::interval(config.flush_interval);
    flush_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            maybe = rx.recv() => match maybe {
                Some(tick) => {
                    if batch.push(&tick) {
                        batch.post(&client, &endpoint, &dropped).await;
                    }
                }
                None => break,
            },
            _ = flush_timer.tick() => {
                if !batch.is_empty() {
                    batch.post(&client, &endpoint, &dropped).await;
                }
            }
        }
    }

    // Drain anything still queued, then flush the tail batch.
    while let Ok(tick) = rx.try_recv() {
        if batch.push(&tick) {
            batch.post(&client, &endpoint, &dropped).await;
        }
    }
    if !batch.is_empty() {
        batch.post(&client, &endpoint, &dropped).await;
    }

    tracing::debug!("http sink writer stopped");
}

/// One in-flight CSV batch.
struct Batch {
    body: String,
    rows: usize,
    flush_rows: usize,
}

impl Batch {
    fn new(flush_rows: usize) -> Self {
        Self {
            body: String::new(),
            rows: 0,
            flush_rows: flush_rows.max(1),
        }
    }

    const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Add a row; true when the batch reached its size threshold.
    fn push(&mut self, tick: &Tick) -> bool {
        self.body.push_str(&tick.csv_row());
        self.body.push('\n');
        self.rows += 1;
        self.rows >= self.flush_rows
    }

    /// POST the batch and reset it. Failures drop the batch and log.
    async fn post(&mut self, client: &reqwest::Client, endpoint: &str, dropped: &Arc<AtomicU64>) {
        let body = std::mem::take(&mut self.body);
        let rows = self.rows;
        self.rows = 0;

        let result = client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/csv")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::trace!(rows, "batch appended");
            }
            Ok(response) => {
                dropped.fetch_add(rows as u64, Ordering::Relaxed);
                tracing::warn!(
                    status = %response.status(),
                    rows,
                    "write endpoint rejected batch, rows dropped"
                );
            }
            Err(e) => {
                dropped.fetch_add(rows as u64, Ordering::Relaxed);
                tracing::warn!(error = %e, rows, "write request failed, rows dropped");
            }
        }
    }
}
