//! JSON-lines file sink
//!
//! Appends one JSON object per finished stream. The file is opened and
//! closed within each publish, so it can be rotated or truncated while the
//! collector runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::stats::PublishedStreamStats;

use super::sink::{SinkError, StreamSink};

/// Appends stream statistics to a JSON-lines file
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    /// Create a sink writing to `path` (created on first publish)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StreamSink for JsonLinesSink {
    fn name(&self) -> &str {
        "json-lines"
    }

    async fn publish(&self, stats: &PublishedStreamStats) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(stats)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), stream = %stats.identity(), "Stream stats appended");
        Ok(())
    }
}
