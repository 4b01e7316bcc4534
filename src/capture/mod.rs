//! Packet capture ingestion
//!
//! The collector does not capture packets itself. It consumes the field dump
//! of an external capture tool (`tshark`), one packet per line:
//!
//! ```text
//! frame.time_epoch,ip.src,ip.dst,udp.srcport,udp.dstport,rtp.seq,rtp.timestamp,rtp.ssrc
//! 1700000000.000000,10.0.0.1,10.0.0.2,4000,5000,1,0,0x1a2b3c4d
//! 1700000000.020000,10.0.0.1,10.0.0.2,4000,5000,2,160,0x1a2b3c4d
//! ```

pub mod parse;
pub mod record;
pub mod source;

pub use parse::{parse_line, ParseError};
pub use record::PacketRecord;
pub use source::{CaptureInput, CaptureSource};
