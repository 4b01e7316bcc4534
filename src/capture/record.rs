//! Captured packet records

use std::net::{IpAddr, SocketAddr};

/// One observed RTP packet, as reported by the capture tool
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    /// Capture arrival time in seconds (epoch or relative, as the source reports it)
    pub capture_time: f64,
    /// Sender IP address
    pub source_addr: IpAddr,
    /// Receiver IP address
    pub destination_addr: IpAddr,
    /// Sender UDP port
    pub source_port: u16,
    /// Receiver UDP port
    pub destination_port: u16,
    /// RTP sequence number
    pub sequence_number: u16,
    /// RTP media timestamp in clock-rate ticks
    pub media_timestamp: u32,
    /// Synchronization source identifier, kept as reported (e.g. `0x1a2b3c4d`)
    pub ssrc: String,
}

impl PacketRecord {
    /// Sender socket address
    pub fn source(&self) -> SocketAddr {
        SocketAddr::new(self.source_addr, self.source_port)
    }

    /// Receiver socket address
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::new(self.destination_addr, self.destination_port)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a record on the default test stream (10.0.0.1:4000 -> 10.0.0.2:5000, SSRC 0xdeadbeef)
    pub fn packet(capture_time: f64, sequence_number: u16, media_timestamp: u32) -> PacketRecord {
        PacketRecord {
            capture_time,
            source_addr: "10.0.0.1".parse().unwrap(),
            destination_addr: "10.0.0.2".parse().unwrap(),
            source_port: 4000,
            destination_port: 5000,
            sequence_number,
            media_timestamp,
            ssrc: "0xdeadbeef".to_string(),
        }
    }
}
