//! Eviction scanner
//!
//! Background task that wakes every scan interval, removes streams that have
//! been silent for at least the publish threshold, and publishes them. It
//! runs until cancelled; cancellation is observed between scans, never in
//! the middle of one.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::publish::FanOut;
use crate::registry::StreamRegistry;

/// Scanner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// Ticking
    Running,
    /// Cancelled and finished (terminal)
    Stopped,
}

/// Counters accumulated by eviction scans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    /// Streams evicted and published
    pub evicted: u64,
    /// Sink deliveries that failed while publishing those streams
    pub failed_deliveries: u64,
}

impl std::ops::AddAssign for ScanTotals {
    fn add_assign(&mut self, other: Self) {
        self.evicted += other.evicted;
        self.failed_deliveries += other.failed_deliveries;
    }
}

/// Handle to a running eviction scanner
pub struct EvictionScanner {
    cancel: CancellationToken,
    handle: JoinHandle<ScanTotals>,
}

impl EvictionScanner {
    /// Spawn the scanner task
    ///
    /// The first scan runs immediately, then once per `interval`.
    pub fn spawn(
        registry: Arc<StreamRegistry>,
        fanout: Arc<FanOut>,
        threshold: Duration,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut totals = ScanTotals::default();

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let scan = scan_once(&registry, &fanout, threshold).await;
                if scan.evicted > 0 {
                    tracing::debug!(
                        evicted = scan.evicted,
                        failed_deliveries = scan.failed_deliveries,
                        "Eviction scan complete"
                    );
                }
                totals += scan;
            }

            tracing::debug!(evicted = totals.evicted, "Eviction scanner stopped");
            totals
        });

        tracing::debug!(
            threshold_secs = threshold.as_secs(),
            interval_secs = interval.as_secs(),
            "Eviction scanner started"
        );

        Self { cancel, handle }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ScannerState {
        if self.handle.is_finished() {
            ScannerState::Stopped
        } else {
            ScannerState::Running
        }
    }

    /// Signal the scanner to stop and wait for an in-flight scan to finish
    ///
    /// Returns what the scanner evicted over its lifetime.
    pub async fn stop(self) -> ScanTotals {
        self.cancel.cancel();

        match self.handle.await {
            Ok(totals) => totals,
            Err(e) => {
                tracing::error!(error = %e, "Eviction scanner task failed");
                ScanTotals::default()
            }
        }
    }
}

/// Run one eviction pass
///
pub async fn scan_once(
    registry: &StreamRegistry,
    fanout: &FanOut,
    threshold: Duration,
) -> ScanTotals {
    let now = Instant::now();
    let mut totals = ScanTotals::default();

    for (identity, slot) in registry.snapshot().await {
        let candidate = {
            let accumulator = slot.lock().await;
            !accumulator.is_retired() && accumulator.is_idle(now, threshold)
        };
        if !candidate {
            continue;
        }

        // Re-checked atomically; a packet may have landed since
        if let Some(stats) = registry.remove_if_idle(&identity, now, threshold).await {
            tracing::info!(
                stream = %identity,
                packets = stats.packet_count,
                "Publishing idle stream"
            );
            let report = fanout.publish_stream_stats(&stats).await;
            totals.evicted += 1;
            totals.failed_deliveries += report.failed.len() as u64;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::record::fixtures::packet;
    use crate::publish::sink::testing::{FailingSink, RecordingSink};

    const THRESHOLD: Duration = Duration::from_secs(30);
    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_scan_once_evicts_only_idle() {
        let registry = StreamRegistry::new();
        let (recorder, seen) = RecordingSink::new("recorder");
        let fanout = FanOut::default().with_sink(recorder);

        registry.add_packet(&packet(0.0, 1, 0)).await;
        tokio::time::advance(Duration::from_secs(20)).await;

        let mut fresh = packet(20.0, 1, 0);
        fresh.destination_port = 6000;
        registry.add_packet(&fresh).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(scan_once(&registry, &fanout, THRESHOLD).await.evicted, 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].destination_port, 5000);
        assert_eq!(registry.stream_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanner_publishes_idle_stream() {
        let registry = Arc::new(StreamRegistry::new());
        let (recorder, seen) = RecordingSink::new("recorder");
        let fanout = Arc::new(FanOut::default().with_sink(recorder));

        registry.add_packet(&packet(0.00, 1, 0)).await;
        registry.add_packet(&packet(0.02, 2, 160)).await;

        let scanner =
            EvictionScanner::spawn(Arc::clone(&registry), Arc::clone(&fanout), THRESHOLD, INTERVAL);
        assert_eq!(scanner.state(), ScannerState::Running);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(16)).await;
        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].packet_count, 2);
        }
        assert_eq!(registry.stream_count().await, 0);

        // Published exactly once
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert_eq!(scanner.stop().await.evicted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_scanner_does_not_scan() {
        let registry = Arc::new(StreamRegistry::new());
        let (recorder, seen) = RecordingSink::new("recorder");
        let fanout = Arc::new(FanOut::default().with_sink(recorder));

        let scanner =
            EvictionScanner::spawn(Arc::clone(&registry), Arc::clone(&fanout), THRESHOLD, INTERVAL);
        assert_eq!(scanner.stop().await, ScanTotals::default());

        registry.add_packet(&packet(0.0, 1, 0)).await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        // Remaining streams are left for the drain
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(registry.stream_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_publish() {
        let registry = Arc::new(StreamRegistry::new());
        let (recorder, seen) = RecordingSink::new("slow");
        let fanout = Arc::new(
            FanOut::default().with_sink(recorder.with_delay(Duration::from_secs(3))),
        );

        registry.add_packet(&packet(0.0, 1, 0)).await;

        let scanner = EvictionScanner::spawn(
            Arc::clone(&registry),
            Arc::clone(&fanout),
            Duration::from_secs(2),
            Duration::from_secs(1),
        );

        // Evicted at the 2 s tick, still inside the sink at 2.5 s
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(registry.stream_count().await, 0);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(scanner.state(), ScannerState::Running);

        let totals = scanner.stop().await;
        assert_eq!(totals.evicted, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert!(registry.drain().await.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_deliveries_counted() {
        let registry = StreamRegistry::new();
        let (recorder, seen) = RecordingSink::new("recorder");
        let fanout = FanOut::default()
            .with_sink(FailingSink { panic: false })
            .with_sink(recorder);

        registry.add_packet(&packet(0.0, 1, 0)).await;
        tokio::time::advance(THRESHOLD).await;

        let totals = scan_once(&registry, &fanout, THRESHOLD).await;
        assert_eq!(
            totals,
            ScanTotals {
                evicted: 1,
                failed_deliveries: 1,
            }
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
