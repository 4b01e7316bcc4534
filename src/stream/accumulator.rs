//! Per-stream rolling state
//!
//! Jitter follows the RFC 3550 §A.8 interarrival estimator. For consecutive
//! packets `i-1` and `i`:
//!
//! ```text
//! D = (arrival_i - arrival_{i-1}) - (ts_i - ts_{i-1}) * clock_period
//! J = J + (|D| - J) / 16
//! ```
//!
//! The estimate after every packet (from the second on) is one jitter
//! sample. Samples and inter-arrival deltas are folded into running
//! summaries as they are produced, so only the previous packet and the
//! current estimate are kept.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::capture::PacketRecord;
use crate::stats::{PublishedStreamStats, RunningSummary, SummaryStats};

use super::identity::StreamIdentity;

/// Media clock rate assumed when none is configured (narrowband audio)
pub const DEFAULT_CLOCK_RATE: u32 = 8000;

/// Gain divisor of the jitter estimator
const JITTER_SMOOTHING: f64 = 16.0;

/// Jitter samples required before a jitter summary is reported
const MIN_JITTER_SAMPLES: u64 = 2;

/// Positive deltas required before a delta summary is reported
const MIN_DELTA_SAMPLES: u64 = 1;

/// Accumulated statistics for one stream
#[derive(Debug)]
pub struct StreamAccumulator {
    identity: StreamIdentity,
    source: SocketAddr,

    /// Wall-clock time the stream was first processed
    created_at: DateTime<Utc>,
    /// Wall-clock time the last packet was processed
    last_packet_at: DateTime<Utc>,
    /// Monotonic time the last packet was processed, for idle checks
    last_seen: Instant,

    packet_count: u64,

    /// Seconds per media clock tick
    clock_period: f64,
    /// Arrival time and media timestamp of the previous packet
    previous: Option<(f64, u32)>,
    /// Current jitter estimate in seconds
    jitter: f64,

    jitter_ms: RunningSummary,
    delta_ms: RunningSummary,

    /// Set once the accumulator has been removed from the registry
    retired: bool,
}

impl StreamAccumulator {
    /// Create an empty accumulator
    pub fn new(identity: StreamIdentity, source: SocketAddr, clock_rate: u32) -> Self {
        let now = Utc::now();

        Self {
            identity,
            source,
            created_at: now,
            last_packet_at: now,
            last_seen: Instant::now(),
            packet_count: 0,
            clock_period: 1.0 / f64::from(clock_rate.max(1)),
            previous: None,
            jitter: 0.0,
            jitter_ms: RunningSummary::new(),
            delta_ms: RunningSummary::new(),
            retired: false,
        }
    }

    /// Create an empty accumulator for the stream `record` belongs to
    pub fn for_record(record: &PacketRecord, clock_rate: u32) -> Self {
        Self::new(StreamIdentity::resolve(record), record.source(), clock_rate)
    }

    /// Fold one packet into the stream state
    pub fn add_packet(&mut self, record: &PacketRecord) {
        self.packet_count += 1;
        self.last_packet_at = Utc::now();
        self.last_seen = Instant::now();

        let arrival = record.capture_time;
        let timestamp = record.media_timestamp;

        if let Some((prev_arrival, prev_timestamp)) = self.previous {
            let delta = arrival - prev_arrival;

            // RTP timestamps wrap at 2^32
            let ticks = timestamp.wrapping_sub(prev_timestamp) as i32;
            let media_delta = f64::from(ticks) * self.clock_period;

            let transit_diff = (delta - media_delta).abs();
            self.jitter += (transit_diff - self.jitter) / JITTER_SMOOTHING;
            self.jitter_ms.push(self.jitter * 1000.0);

            // Duplicates and reordered arrivals say nothing about spacing
            if delta > 0.0 {
                self.delta_ms.push(delta * 1000.0);
            }
        }

        self.previous = Some((arrival, timestamp));
    }

    /// Stream identity
    pub fn identity(&self) -> &StreamIdentity {
        &self.identity
    }

    /// Sender of the first packet
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// Number of packets processed
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Current jitter estimate in seconds
    pub fn jitter_estimate(&self) -> f64 {
        self.jitter
    }

    /// Jitter min/mean/max in milliseconds, once at least two samples exist
    pub fn jitter_stats(&self) -> Option<SummaryStats> {
        self.jitter_ms.summarize(MIN_JITTER_SAMPLES)
    }

    /// Positive delta min/mean/max in milliseconds
    pub fn delta_stats(&self) -> Option<SummaryStats> {
        self.delta_ms.summarize(MIN_DELTA_SAMPLES)
    }

    /// Wall-clock creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wall-clock time of the last processed packet
    pub fn last_packet_at(&self) -> DateTime<Utc> {
        self.last_packet_at
    }

    /// Time since the last packet was processed
    pub fn idle_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    /// Whether the stream has been silent for at least `threshold`
    pub fn is_idle(&self, now: Instant, threshold: Duration) -> bool {
        self.idle_time(now) >= threshold
    }

    /// Whether the accumulator has left the registry
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Mark the accumulator as removed; no packet is added afterwards
    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    /// Take the final statistics snapshot
    pub fn snapshot(&self) -> PublishedStreamStats {
        PublishedStreamStats {
            source_addr: self.source.ip(),
            source_port: self.source.port(),
            destination_addr: self.identity.destination_addr,
            destination_port: self.identity.destination_port,
            ssrc: self.identity.ssrc.clone(),
            created_at: self.created_at,
            last_packet_at: self.last_packet_at,
            packet_count: self.packet_count,
            jitter: self.jitter_stats(),
            delta: self.delta_stats(),
        }
    }
}
