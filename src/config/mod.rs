//! Collector configuration
//!
//! Configuration is layered: [`CollectorConfig::default`], then the optional
//! JSON [`Settings`] file, then command-line flags. The result is validated
//! once, before ingestion starts; any [`ConfigError`] is fatal.

pub mod collector;
pub mod error;
pub mod settings;

pub use collector::{CollectorConfig, SinkKind, MAX_PUBLISH_THRESHOLD, MIN_PUBLISH_THRESHOLD};
pub use error::ConfigError;
pub use settings::Settings;
