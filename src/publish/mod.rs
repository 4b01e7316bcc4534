//! Publication of finished streams
//!
//! - [`StreamSink`]: the capability a destination implements
//! - [`FanOut`]: ordered delivery to several sinks with per-sink failure isolation
//! - [`ConsoleSink`], [`JsonLinesSink`], and `MySqlSink` (feature `mysql`)

pub mod console;
pub mod fanout;
pub mod json_lines;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod sink;

pub use console::ConsoleSink;
pub use fanout::{FanOut, PublishReport};
pub use json_lines::JsonLinesSink;
#[cfg(feature = "mysql")]
pub use mysql::MySqlSink;
pub use sink::{SinkError, StreamSink};
