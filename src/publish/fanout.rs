//! Publisher fan-out
//!
//! Delivers each finished stream to every configured sink, in order, on the
//! calling task. A sink that fails (or panics) is logged and skipped; the
//! remaining sinks still receive the same statistics.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::stats::PublishedStreamStats;

use super::sink::{SinkError, StreamSink};

/// Outcome of publishing one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Sinks that accepted the stats, in publish order
    pub delivered: Vec<String>,
    /// Sinks that failed, in publish order
    pub failed: Vec<String>,
}

impl PublishReport {
    /// Whether every sink accepted the stats
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered, fixed list of sinks
pub struct FanOut {
    sinks: Vec<Box<dyn StreamSink>>,
}

impl FanOut {
    /// Create a fan-out over `sinks`, published to in list order
    pub fn new(sinks: Vec<Box<dyn StreamSink>>) -> Self {
        Self { sinks }
    }

    /// Append a sink
    pub fn with_sink(mut self, sink: impl StreamSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Sink names, in publish order
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    /// Number of sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are configured
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Publish one stream's statistics to every sink
    ///
    /// Never fails: sink failures are logged and reported, not propagated.
    pub async fn publish_stream_stats(&self, stats: &PublishedStreamStats) -> PublishReport {
        let mut report = PublishReport::default();
        let stream = stats.identity();

        for sink in &self.sinks {
            let outcome = AssertUnwindSafe(sink.publish(stats))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(SinkError::Panicked(panic_message(panic))));

            match outcome {
                Ok(()) => {
                    tracing::debug!(sink = sink.name(), stream = %stream, "Stream stats published");
                    report.delivered.push(sink.name().to_string());
                }
                Err(e) => {
                    tracing::error!(
                        sink = sink.name(),
                        stream = %stream,
                        error = %e,
                        "Failed to publish stream stats"
                    );
                    report.failed.push(sink.name().to_string());
                }
            }
        }

        report
    }
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
