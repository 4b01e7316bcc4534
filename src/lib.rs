//! Per-stream RTP jitter and inter-arrival statistics
//!
//! Consumes one line per captured RTP packet (as produced by `tshark -T fields`),
//! groups packets into streams by destination address, port and SSRC, and
//! accumulates for each stream:
//!
//! - the RFC 3550 interarrival jitter estimate, with min/mean/max over the
//!   stream's lifetime
//! - inter-arrival deltas, with min/mean/max
//!
//! A stream that stays silent for the publish threshold is removed and its
//! statistics are handed to every configured sink. Streams still active when
//! input ends (or on shutdown) are published once during the final drain.
//!
//! # Example
//!
//! ```no_run
//! use rtp_stream_stats::{Collector, CollectorConfig};
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> rtp_stream_stats::Result<()> {
//!     let config = CollectorConfig::default();
//!     config.validate()?;
//!
//!     let collector = Collector::new(&config, config.build_fanout()?);
//!     let reader = BufReader::new(tokio::io::stdin());
//!     let summary = collector
//!         .run(reader, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     println!("{} packets", summary.packets);
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod collector;
pub mod config;
pub mod error;
pub mod publish;
pub mod registry;
pub mod stats;
pub mod stream;

pub use capture::{CaptureInput, CaptureSource, PacketRecord};
pub use collector::{Collector, IngestSummary};
pub use config::{CollectorConfig, Settings, SinkKind};
pub use error::{Error, Result};
pub use publish::{FanOut, PublishReport, SinkError, StreamSink};
pub use registry::{RegistryConfig, StreamRegistry};
pub use stats::{PublishedStreamStats, SummaryStats};
pub use stream::{StreamAccumulator, StreamIdentity};
