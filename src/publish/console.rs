//! Console sink

use std::io::Write;

use async_trait::async_trait;

use crate::stats::PublishedStreamStats;

use super::sink::{SinkError, StreamSink};

/// Prints a short human-readable report per stream to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a console sink
    pub fn new() -> Self {
        Self
    }
}

/// Render the console report for one stream
pub fn render(stats: &PublishedStreamStats) -> String {
    let mut out = format!(
        "RTP Stream stats - {} to {}, SSRC {}, {} packets\n",
        stats.source(),
        stats.destination(),
        stats.ssrc,
        stats.packet_count
    );

    if let Some(jitter) = stats.jitter {
        out.push_str(&format!(
            "Jitter (ms) - min: {:.3}, mean: {:.3}, max: {:.3}\n",
            jitter.min, jitter.mean, jitter.max
        ));
    }

    if let Some(delta) = stats.delta {
        out.push_str(&format!(
            "Delta (ms) - min: {:.3}ms, mean: {:.3}ms, max: {:.3}ms\n",
            delta.min, delta.mean, delta.max
        ));
    }

    out
}

#[async_trait]
impl StreamSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn publish(&self, stats: &PublishedStreamStats) -> Result<(), SinkError> {
        let report = render(stats);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout)?;
        stdout.write_all(report.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
