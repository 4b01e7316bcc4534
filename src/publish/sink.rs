//! Sink trait
//!
//! A sink is anything that accepts finished stream statistics: a console
//! printer, a file, a database table.

use async_trait::async_trait;
use thiserror::Error;

use crate::stats::PublishedStreamStats;

/// Error type for a failed publish
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the sink's output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Statistics could not be encoded
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    /// Database connection or statement failed
    #[cfg(feature = "mysql")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// The sink panicked while publishing
    #[error("sink panicked: {0}")]
    Panicked(String),
}

/// Destination for finished stream statistics
///
/// Any resource a sink needs is acquired and released inside a single
/// [`publish`](StreamSink::publish) call.
#[async_trait]
pub trait StreamSink: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Publish the statistics of one finished stream
    async fn publish(&self, stats: &PublishedStreamStats) -> Result<(), SinkError>;
}
