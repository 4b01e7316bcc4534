//! Stream registry implementation
//!
//! The registry owns every active [`StreamAccumulator`]. Ingestion appends
//! packets through it while the eviction scanner removes idle streams.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::capture::PacketRecord;
use crate::stats::PublishedStreamStats;
use crate::stream::{StreamAccumulator, StreamIdentity};

use super::config::RegistryConfig;

/// Shared handle to one registry slot
pub type StreamSlot = Arc<Mutex<StreamAccumulator>>;

/// Central registry for all active streams
///
/// Removal always happens with the map write lock held *and* the slot
/// locked, and marks the accumulator retired before it leaves the map. A
/// packet that resolved a slot just before it was evicted sees the retired
/// flag and re-resolves, landing in a fresh accumulator instead of a
/// snapshot that has already been published.
pub struct StreamRegistry {
    /// Map of stream identity to accumulator
    streams: RwLock<HashMap<StreamIdentity, StreamSlot>>,

    /// Configuration
    config: RegistryConfig,
}

impl StreamRegistry {
    /// Create a new stream registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new stream registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get or create the accumulator for the stream `record` belongs to
    ///
    /// Concurrent callers resolving the same new identity all receive the
    /// same slot.
    pub async fn resolve(&self, record: &PacketRecord) -> StreamSlot {
        let identity = StreamIdentity::resolve(record);

        if let Some(slot) = self.streams.read().await.get(&identity) {
            return Arc::clone(slot);
        }

        let mut streams = self.streams.write().await;
        match streams.entry(identity) {
            // Another caller created it between our read and write lock
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                tracing::info!(
                    stream = %entry.key(),
                    source = %record.source(),
                    "New stream"
                );

                let accumulator = StreamAccumulator::for_record(record, self.config.clock_rate);
                Arc::clone(entry.insert(Arc::new(Mutex::new(accumulator))))
            }
        }
    }

    /// Append a packet to its stream, creating the stream if needed
    pub async fn add_packet(&self, record: &PacketRecord) {
        loop {
            let slot = self.resolve(record).await;
            let mut accumulator = slot.lock().await;

            if accumulator.is_retired() {
                tracing::debug!(
                    stream = %accumulator.identity(),
                    "Stream evicted while packet in flight, re-resolving"
                );
                continue;
            }

            accumulator.add_packet(record);
            return;
        }
    }

    /// Point-in-time list of active streams
    ///
    /// The returned slots stay valid while ingestion continues; a slot may
    /// already be retired by the time it is inspected.
    pub async fn snapshot(&self) -> Vec<(StreamIdentity, StreamSlot)> {
        self.streams
            .read()
            .await
            .iter()
            .map(|(identity, slot)| (identity.clone(), Arc::clone(slot)))
            .collect()
    }

    /// Remove a stream if it has been idle for at least `threshold` at `now`
    ///
    /// Idle time is re-checked under the slot lock, so a packet that arrived
    /// after the caller decided to evict keeps the stream registered.
    pub async fn remove_if_idle(
        &self,
        identity: &StreamIdentity,
        now: Instant,
        threshold: Duration,
    ) -> Option<PublishedStreamStats> {
        let mut streams = self.streams.write().await;
        let slot = Arc::clone(streams.get(identity)?);
        let mut accumulator = slot.lock().await;

        if !accumulator.is_idle(now, threshold) {
            tracing::debug!(stream = %identity, "Stream became active, eviction skipped");
            return None;
        }

        accumulator.retire();
        streams.remove(identity);

        tracing::debug!(
            stream = %identity,
            packets = accumulator.packet_count(),
            idle_secs = accumulator.idle_time(now).as_secs(),
            "Stream removed as idle"
        );

        Some(accumulator.snapshot())
    }

    /// Remove every remaining stream, returning their final snapshots
    pub async fn drain(&self) -> Vec<PublishedStreamStats> {
        let mut streams = self.streams.write().await;
        let slots: Vec<StreamSlot> = streams.drain().map(|(_, slot)| slot).collect();

        let mut drained = Vec::with_capacity(slots.len());
        for slot in slots {
            let mut accumulator = slot.lock().await;
            accumulator.retire();
            drained.push(accumulator.snapshot());
        }

        tracing::debug!(streams = drained.len(), "Registry drained");
        drained
    }

    /// Check if a stream is registered
    pub async fn contains(&self, identity: &StreamIdentity) -> bool {
        self.streams.read().await.contains_key(identity)
    }

    /// Get total number of streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::capture::record::fixtures::packet;

    const THRESHOLD: Duration = Duration::from_secs(30);

    async fn packet_count(registry: &StreamRegistry, identity: &StreamIdentity) -> Option<u64> {
        for (id, slot) in registry.snapshot().await {
            if &id == identity {
                return Some(slot.lock().await.packet_count());
            }
        }
        None
    }

    #[tokio::test]
    async fn test_resolve_creates_once() {
        let registry = StreamRegistry::new();
        let record = packet(0.0, 1, 0);

        let first = registry.resolve(&record).await;
        let second = registry.resolve(&record).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.stream_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_packet() {
        let registry = StreamRegistry::new();
        registry.add_packet(&packet(0.00, 1, 0)).await;
        registry.add_packet(&packet(0.02, 2, 160)).await;

        let identity = StreamIdentity::resolve(&packet(0.0, 1, 0));
        assert!(registry.contains(&identity).await);
        assert_eq!(packet_count(&registry, &identity).await, Some(2));
    }

    #[tokio::test]
    async fn test_separate_streams() {
        let registry = StreamRegistry::new();
        let mut other = packet(0.0, 1, 0);
        other.destination_port = 5002;

        registry.add_packet(&packet(0.0, 1, 0)).await;
        registry.add_packet(&other).await;

        assert_eq!(registry.stream_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolve_single_stream() {
        let registry = Arc::new(StreamRegistry::new());

        let tasks: Vec<_> = (0..64u16)
            .map(|seq| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .add_packet(&packet(seq as f64 * 0.02, seq, seq as u32 * 160))
                        .await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let identity = StreamIdentity::resolve(&packet(0.0, 0, 0));
        assert_eq!(registry.stream_count().await, 1);
        assert_eq!(packet_count(&registry, &identity).await, Some(64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_if_idle() {
        let registry = StreamRegistry::new();
        let record = packet(0.0, 1, 0);
        let identity = StreamIdentity::resolve(&record);
        registry.add_packet(&record).await;

        // Not idle yet
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(registry
            .remove_if_idle(&identity, Instant::now(), THRESHOLD)
            .await
            .is_none());
        assert!(registry.contains(&identity).await);

        tokio::time::advance(Duration::from_secs(20)).await;
        let stats = registry
            .remove_if_idle(&identity, Instant::now(), THRESHOLD)
            .await
            .unwrap();

        assert_eq!(stats.packet_count, 1);
        assert_eq!(stats.identity(), identity);
        assert!(!registry.contains(&identity).await);

        // Already gone
        assert!(registry
            .remove_if_idle(&identity, Instant::now(), THRESHOLD)
            .await
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_packet_after_idle_check_keeps_stream() {
        let registry = StreamRegistry::new();
        let identity = StreamIdentity::resolve(&packet(0.0, 1, 0));
        registry.add_packet(&packet(0.0, 1, 0)).await;

        tokio::time::advance(THRESHOLD).await;
        // Scanner sampled its clock here and saw an idle stream...
        let scanned_at = Instant::now();

        // ...then a packet arrived before the removal ran
        tokio::time::advance(Duration::from_millis(1)).await;
        registry.add_packet(&packet(30.0, 2, 240_000)).await;

        assert!(registry
            .remove_if_idle(&identity, scanned_at, THRESHOLD)
            .await
            .is_none());
        assert_eq!(packet_count(&registry, &identity).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_packet_after_eviction_starts_new_stream() {
        let registry = StreamRegistry::new();
        let identity = StreamIdentity::resolve(&packet(0.0, 1, 0));
        registry.add_packet(&packet(0.0, 1, 0)).await;

        // A slot resolved before eviction must not swallow the next packet
        let stale = registry.resolve(&packet(0.0, 1, 0)).await;

        tokio::time::advance(THRESHOLD).await;
        let stats = registry
            .remove_if_idle(&identity, Instant::now(), THRESHOLD)
            .await
            .unwrap();
        assert_eq!(stats.packet_count, 1);
        assert!(stale.lock().await.is_retired());

        registry.add_packet(&packet(30.0, 2, 240_000)).await;
        assert_eq!(packet_count(&registry, &identity).await, Some(1));
        assert_eq!(stale.lock().await.packet_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_eviction_never_loses_packet() {
        const PACKETS: u16 = 20_000;

        let registry = Arc::new(StreamRegistry::new());
        let identity = StreamIdentity::resolve(&packet(0.0, 0, 0));
        let done = Arc::new(AtomicBool::new(false));

        // Evicts on every pass, so slots are routinely retired between
        // resolve and append
        let evictor = {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut published = 0u64;
                while !done.load(Ordering::Acquire) {
                    if let Some(stats) = registry
                        .remove_if_idle(&identity, Instant::now(), Duration::ZERO)
                        .await
                    {
                        published += stats.packet_count;
                    }
                    tokio::task::yield_now().await;
                }
                published
            })
        };

        let ingester = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for seq in 0..PACKETS {
                    registry
                        .add_packet(&packet(seq as f64 * 0.02, seq, seq as u32 * 160))
                        .await;
                }
            })
        };

        ingester.await.unwrap();
        done.store(true, Ordering::Release);
        let published = evictor.await.unwrap();

        let drained: u64 = registry
            .drain()
            .await
            .iter()
            .map(|stats| stats.packet_count)
            .sum();

        assert_eq!(published + drained, u64::from(PACKETS));
    }

    #[tokio::test]
    async fn test_drain() {
        let registry = StreamRegistry::new();
        for port in [5000, 5002, 5004] {
            let mut record = packet(0.0, 1, 0);
            record.destination_port = port;
            registry.add_packet(&record).await;
        }

        let drained = registry.drain().await;
        assert_eq!(drained.len(), 3);
        assert_eq!(registry.stream_count().await, 0);
        assert!(registry.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_clock_rate_from_config() {
        let registry = StreamRegistry::with_config(RegistryConfig::default().clock_rate(48_000));
        registry.add_packet(&packet(0.000, 1, 0)).await;
        registry.add_packet(&packet(0.020, 2, 960)).await;

        let slot = registry.resolve(&packet(0.0, 1, 0)).await;
        assert!(slot.lock().await.jitter_estimate().abs() < 1e-9);
    }
}
