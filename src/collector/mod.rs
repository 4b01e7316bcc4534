//! Collector control flow
//!
//! Ties ingestion, the eviction scanner and the shutdown drain together:
//!
//! 1. Read capture lines, appending each parsed packet to the registry,
//!    while the [`EvictionScanner`] publishes idle streams in the background.
//! 2. On end of input or a shutdown signal, stop the scanner and wait for
//!    any scan in progress.
//! 3. Drain the registry, publishing every remaining stream once.

pub mod scanner;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::capture::parse_line;
use crate::config::CollectorConfig;
use crate::error::Result;
use crate::publish::FanOut;
use crate::registry::StreamRegistry;

pub use scanner::{scan_once, EvictionScanner, ScanTotals, ScannerState};

/// Ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Packets appended to a stream
    pub packets: u64,
    /// Malformed lines skipped
    pub skipped: u64,
    /// Streams published by the eviction scanner
    pub evicted: u64,
    /// Streams published by the shutdown drain
    pub drained: u64,
    /// Sink deliveries that failed, over evicted and drained streams
    pub failed_deliveries: u64,
}

/// RTP stream statistics collector
pub struct Collector {
    registry: Arc<StreamRegistry>,
    fanout: Arc<FanOut>,
    publish_threshold: Duration,
    scan_interval: Duration,
    packets: AtomicU64,
    skipped: AtomicU64,
    evicted: AtomicU64,
    drained: AtomicU64,
    failed_deliveries: AtomicU64,
}

impl Collector {
    /// Create a collector publishing through `fanout`
    ///
    /// `config` is expected to be validated already.
    pub fn new(config: &CollectorConfig, fanout: FanOut) -> Self {
        Self {
            registry: Arc::new(StreamRegistry::with_config(config.registry_config())),
            fanout: Arc::new(fanout),
            publish_threshold: config.publish_threshold,
            scan_interval: config.scan_interval,
            packets: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            failed_deliveries: AtomicU64::new(0),
        }
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get a reference to the sink fan-out
    pub fn fanout(&self) -> &Arc<FanOut> {
        &self.fanout
    }

    /// Run until `reader` is exhausted or `shutdown` resolves, then drain
    ///
    /// The drain happens even when reading fails; the read error is returned
    /// afterwards.
    pub async fn run<R, F>(&self, reader: R, shutdown: F) -> Result<IngestSummary>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let scanner = EvictionScanner::spawn(
            Arc::clone(&self.registry),
            Arc::clone(&self.fanout),
            self.publish_threshold,
            self.scan_interval,
        );

        let result = tokio::select! {
            result = self.ingest(reader) => {
                tracing::info!("End of capture input");
                result
            }
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
        };

        let scans = scanner.stop().await;
        self.evicted.fetch_add(scans.evicted, Ordering::Relaxed);
        self.failed_deliveries
            .fetch_add(scans.failed_deliveries, Ordering::Relaxed);

        let drained = self.drain().await;
        tracing::info!(streams = drained, "Remaining streams published");

        result?;
        Ok(self.summary())
    }

    /// Read capture lines until end of input
    ///
    /// Malformed lines are logged and skipped.
    pub async fn ingest<R>(&self, mut reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            line_no += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "Ignored row, not valid UTF-8");
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            match parse_line(line) {
                Ok(Some(record)) => {
                    self.registry.add_packet(&record).await;
                    self.packets.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "Ignored malformed row");
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Publish every remaining stream, regardless of idle time
    ///
    /// Returns the number of streams published. Only call once the scanner
    /// has stopped.
    pub async fn drain(&self) -> usize {
        let remaining = self.registry.drain().await;
        for stats in &remaining {
            let report = self.fanout.publish_stream_stats(stats).await;
            self.failed_deliveries
                .fetch_add(report.failed.len() as u64, Ordering::Relaxed);
        }

        self.drained
            .fetch_add(remaining.len() as u64, Ordering::Relaxed);
        remaining.len()
    }

    /// Current ingestion counters
    ///
    /// `evicted` is only updated once [`run`](Self::run) has stopped the scanner.
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            packets: self.packets.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            failed_deliveries: self.failed_deliveries.load(Ordering::Relaxed),
        }
    }
}
