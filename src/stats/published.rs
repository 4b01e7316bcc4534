//! Final per-stream statistics handed to sinks

use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::summary::SummaryStats;
use crate::stream::StreamIdentity;

/// Immutable snapshot of a finished stream
///
/// Produced once when a stream is evicted or drained; the accumulator it was
/// taken from is discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedStreamStats {
    /// Sender IP address (of the first packet seen)
    pub source_addr: IpAddr,
    /// Sender UDP port (of the first packet seen)
    pub source_port: u16,
    /// Receiver IP address
    pub destination_addr: IpAddr,
    /// Receiver UDP port
    pub destination_port: u16,
    /// Synchronization source identifier
    pub ssrc: String,
    /// When the collector first saw the stream
    pub created_at: DateTime<Utc>,
    /// When the collector processed the last packet
    pub last_packet_at: DateTime<Utc>,
    /// Total packets processed, including out-of-order ones
    pub packet_count: u64,
    /// Jitter summary in milliseconds (absent below 3 packets)
    pub jitter: Option<SummaryStats>,
    /// Positive inter-arrival delta summary in milliseconds
    pub delta: Option<SummaryStats>,
}

impl PublishedStreamStats {
    /// Identity of the stream these stats describe
    pub fn identity(&self) -> StreamIdentity {
        StreamIdentity::new(self.destination(), self.ssrc.clone())
    }

    /// Sender socket address
    pub fn source(&self) -> SocketAddr {
        SocketAddr::new(self.source_addr, self.source_port)
    }

    /// Receiver socket address
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::new(self.destination_addr, self.destination_port)
    }
}
