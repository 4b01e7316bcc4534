//! Statistics types for RTP streams

pub mod published;
pub mod summary;

pub use published::PublishedStreamStats;
pub use summary::{RunningSummary, SummaryStats};
