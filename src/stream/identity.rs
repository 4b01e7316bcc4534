//! Stream identity
//!
//! A stream is identified by where its packets go and who says they sent
//! them: destination address, destination port and SSRC. The source endpoint
//! is not part of the key, so two senders reusing one SSRC towards the same
//! destination are merged into one stream.

use std::net::{IpAddr, SocketAddr};

use crate::capture::PacketRecord;

/// Unique identifier for a stream (destination + SSRC)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamIdentity {
    /// Receiver IP address
    pub destination_addr: IpAddr,
    /// Receiver UDP port
    pub destination_port: u16,
    /// Synchronization source identifier
    pub ssrc: String,
}

impl StreamIdentity {
    /// Create a new stream identity
    pub fn new(destination: SocketAddr, ssrc: impl Into<String>) -> Self {
        Self {
            destination_addr: destination.ip(),
            destination_port: destination.port(),
            ssrc: ssrc.into(),
        }
    }

    /// Derive the identity of the stream a packet belongs to
    pub fn resolve(record: &PacketRecord) -> Self {
        Self {
            destination_addr: record.destination_addr,
            destination_port: record.destination_port,
            ssrc: record.ssrc.clone(),
        }
    }

    /// Receiver socket address
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::new(self.destination_addr, self.destination_port)
    }
}

impl std::fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.destination(), self.ssrc)
    }
}
