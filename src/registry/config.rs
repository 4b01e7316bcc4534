//! Registry configuration

use crate::stream::DEFAULT_CLOCK_RATE;

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Media clock rate (Hz) used by every accumulator the registry creates
    pub clock_rate: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            clock_rate: DEFAULT_CLOCK_RATE,
        }
    }
}

impl RegistryConfig {
    /// Set the media clock rate
    pub fn clock_rate(mut self, hz: u32) -> Self {
        self.clock_rate = hz;
        self
    }
}
