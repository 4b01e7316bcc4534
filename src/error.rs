//! Error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the collector
///
/// Malformed capture lines and sink failures are handled where they occur
/// and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Capture source could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for collector operations
pub type Result<T> = std::result::Result<T, Error>;
