//! Collector configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureSource;
use crate::publish::{ConsoleSink, FanOut, JsonLinesSink, StreamSink};
use crate::registry::RegistryConfig;
use crate::stream::DEFAULT_CLOCK_RATE;

use super::error::ConfigError;

/// Shortest accepted publish threshold
pub const MIN_PUBLISH_THRESHOLD: Duration = Duration::from_secs(2);

/// Longest accepted publish threshold (one day)
pub const MAX_PUBLISH_THRESHOLD: Duration = Duration::from_secs(60 * 60 * 24);

/// Kind of sink to publish finished streams to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Human-readable report on stdout
    Console,
    /// JSON object per stream appended to a file
    JsonLines,
    /// Row per stream in a MySQL table
    #[serde(rename = "mysql")]
    #[value(name = "mysql")]
    MySql,
}

/// Collector configuration options
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Silence after which a stream is published and forgotten
    pub publish_threshold: Duration,

    /// How often idle streams are looked for
    pub scan_interval: Duration,

    /// Media clock rate (Hz) assumed for every stream
    pub clock_rate: u32,

    /// Sinks, in publish order
    pub sinks: Vec<SinkKind>,

    /// Output file for the JSON-lines sink
    pub json_output_path: Option<PathBuf>,

    /// Connection string for the MySQL sink
    pub mysql_connection_string: Option<String>,

    /// Where capture lines come from
    pub capture: CaptureSource,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            publish_threshold: Duration::from_secs(30),
            scan_interval: Duration::from_secs(5),
            clock_rate: DEFAULT_CLOCK_RATE,
            sinks: vec![SinkKind::Console],
            json_output_path: None,
            mysql_connection_string: None,
            capture: CaptureSource::default(),
        }
    }
}

impl CollectorConfig {
    /// Set the publish threshold
    pub fn publish_threshold(mut self, threshold: Duration) -> Self {
        self.publish_threshold = threshold;
        self
    }

    /// Set the scan interval
    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Set the media clock rate
    pub fn clock_rate(mut self, hz: u32) -> Self {
        self.clock_rate = hz;
        self
    }

    /// Replace the sink list
    pub fn sinks(mut self, sinks: Vec<SinkKind>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Set the JSON-lines output file
    pub fn json_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_output_path = Some(path.into());
        self
    }

    /// Set the MySQL connection string
    pub fn mysql_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.mysql_connection_string = Some(connection_string.into());
        self
    }

    /// Set the capture source
    pub fn capture(mut self, capture: CaptureSource) -> Self {
        self.capture = capture;
        self
    }

    /// Registry configuration derived from this config
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default().clock_rate(self.clock_rate)
    }

    /// Check every bound and required setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish_threshold < MIN_PUBLISH_THRESHOLD {
            return Err(ConfigError::ThresholdTooLow(self.publish_threshold));
        }
        if self.publish_threshold > MAX_PUBLISH_THRESHOLD {
            return Err(ConfigError::ThresholdTooHigh(self.publish_threshold));
        }
        if self.scan_interval.is_zero() {
            return Err(ConfigError::ZeroScanInterval);
        }
        if self.clock_rate == 0 {
            return Err(ConfigError::ZeroClockRate);
        }
        if self.sinks.is_empty() {
            return Err(ConfigError::NoSinks);
        }

        for sink in &self.sinks {
            match sink {
                SinkKind::Console => {}
                SinkKind::JsonLines => {
                    if self.json_output_path.is_none() {
                        return Err(ConfigError::MissingSetting("JSON output path"));
                    }
                }
                SinkKind::MySql => {
                    if !cfg!(feature = "mysql") {
                        return Err(ConfigError::SinkUnavailable("mysql"));
                    }
                    let configured = self
                        .mysql_connection_string
                        .as_deref()
                        .is_some_and(|s| !s.trim().is_empty());
                    if !configured {
                        return Err(ConfigError::MissingSetting("MySQL connection string"));
                    }
                }
            }
        }

        if let CaptureSource::Tshark { interface } = &self.capture {
            if interface.trim().is_empty() {
                return Err(ConfigError::MissingSetting("capture interface"));
            }
        }

        Ok(())
    }

    /// Build the sink fan-out, in configured order
    pub fn build_fanout(&self) -> Result<FanOut, ConfigError> {
        let mut sinks: Vec<Box<dyn StreamSink>> = Vec::with_capacity(self.sinks.len());

        for sink in &self.sinks {
            match sink {
                SinkKind::Console => sinks.push(Box::new(ConsoleSink::new())),
                SinkKind::JsonLines => {
                    let path = self
                        .json_output_path
                        .clone()
                        .ok_or(ConfigError::MissingSetting("JSON output path"))?;
                    sinks.push(Box::new(JsonLinesSink::new(path)));
                }
                SinkKind::MySql => sinks.push(self.mysql_sink()?),
            }
        }

        Ok(FanOut::new(sinks))
    }

    #[cfg(feature = "mysql")]
    fn mysql_sink(&self) -> Result<Box<dyn StreamSink>, ConfigError> {
        let connection_string = self
            .mysql_connection_string
            .clone()
            .ok_or(ConfigError::MissingSetting("MySQL connection string"))?;
        Ok(Box::new(crate::publish::MySqlSink::new(connection_string)))
    }

    #[cfg(not(feature = "mysql"))]
    fn mysql_sink(&self) -> Result<Box<dyn StreamSink>, ConfigError> {
        Err(ConfigError::SinkUnavailable("mysql"))
    }
}
