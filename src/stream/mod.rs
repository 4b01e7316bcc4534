//! RTP stream identity and per-stream accumulation

pub mod accumulator;
pub mod identity;

pub use accumulator::{StreamAccumulator, DEFAULT_CLOCK_RATE};
pub use identity::StreamIdentity;
