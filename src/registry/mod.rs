//! Stream registry for active RTP streams
//!
//! The registry maps each [`StreamIdentity`](crate::stream::StreamIdentity)
//! to the accumulator collecting its statistics. Two tasks share it:
//!
//! ```text
//!                        Arc<StreamRegistry>
//!                   ┌───────────────────────────┐
//!                   │ streams: HashMap<Identity,│
//!                   │   Arc<Mutex<              │
//!                   │     StreamAccumulator>>   │
//!                   │ >                         │
//!                   └─────────────┬─────────────┘
//!                                 │
//!            ┌────────────────────┴────────────────────┐
//!            │                                         │
//!            ▼                                         ▼
//!      [Ingestion]                             [Eviction scanner]
//!      add_packet()                            snapshot()
//!                                              remove_if_idle() ──► Fan-out
//! ```

pub mod config;
pub mod store;

pub use config::RegistryConfig;
pub use store::{StreamRegistry, StreamSlot};
