//! Configuration error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error type for configuration loading and validation
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Publish threshold below the minimum
    #[error("publish threshold {0:?} is too low, it must be at least 2 seconds")]
    ThresholdTooLow(Duration),
    /// Publish threshold above the maximum
    #[error("publish threshold {0:?} is too high, it must be at most 1 day")]
    ThresholdTooHigh(Duration),
    /// Scan interval of zero
    #[error("scan interval must be greater than zero")]
    ZeroScanInterval,
    /// Media clock rate of zero
    #[error("clock rate must be greater than zero")]
    ZeroClockRate,
    /// No sink to publish to
    #[error("at least one sink must be configured")]
    NoSinks,
    /// A setting required by the selected sinks or capture source is absent
    #[error("{0} not configured")]
    MissingSetting(&'static str),
    /// A sink was requested that this build does not include
    #[error("sink {0} is not available in this build")]
    SinkUnavailable(&'static str),
    /// Settings file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Settings file is not valid JSON for [`Settings`](super::Settings)
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
