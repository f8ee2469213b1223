//! Local cluster
//!
//! In-process stand-in for the remote clustered store.
//!
//! ## Responsibilities
//! - Hold entries per map (see [`EntryStore`])
//! - Evaluate compiled predicates against decoded values
//! - Produce the backup sweep for every primary mutation
//! - Deliver notification batches on per-partition threads

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::config::ClientConfig;
use crate::error::{GridError, Result};
use crate::key::Key;
use crate::query::CompiledPredicate;
use crate::value::decode_value;

use super::sweep::{backup_sweep, Mutation};
use super::{Ack, EntryStore, NotificationSink, OpKind, RawNotification, Transport};

type Sinks = Arc<RwLock<Vec<Arc<dyn NotificationSink>>>>;

/// The in-process cluster
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Mutations** (put/remove/evict/clear): serialized by `write_lock`
///   - store update and notification enqueue happen under the same guard,
///     so notifications for a key are enqueued in mutation order
///
/// - **Reads** (get/size/query): concurrent, store-level read lock only
///
/// - **Delivery**: each key routes to one partition (CRC32 of map + key);
///   a partition's thread hands its batches to every sink in order
pub struct LocalCluster {
    store: EntryStore,

    /// One sender per partition delivery thread
    partitions: Vec<Sender<Vec<RawNotification>>>,

    /// Feed consumers, shared with the delivery threads
    sinks: Sinks,

    /// Cleared to simulate an unreachable cluster
    reachable: AtomicBool,

    /// Serializes mutations
    write_lock: Mutex<()>,
}

impl LocalCluster {
    /// Start a cluster with `config.partition_count` delivery threads
    pub fn new(config: &ClientConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let sinks: Sinks = Arc::new(RwLock::new(Vec::new()));
        let mut partitions = Vec::with_capacity(config.partition_count);

        for partition in 0..config.partition_count {
            let (tx, rx) = channel::unbounded();
            let sinks = Arc::clone(&sinks);
            thread::Builder::new()
                .name(format!("{}-partition-{}", config.client_name, partition))
                .spawn(move || Self::run_partition(rx, sinks))?;
            partitions.push(tx);
        }

        tracing::debug!(
            partitions = config.partition_count,
            client = %config.client_name,
            "Local cluster started"
        );

        Ok(Arc::new(Self {
            store: EntryStore::new(),
            partitions,
            sinks,
            reachable: AtomicBool::new(true),
            write_lock: Mutex::new(()),
        }))
    }

    /// Delivery loop of one partition; exits when the cluster is dropped
    fn run_partition(rx: Receiver<Vec<RawNotification>>, sinks: Sinks) {
        for batch in rx.iter() {
            let sinks = sinks.read().clone();
            for sink in sinks {
                sink.deliver(&batch);
            }
        }
    }

    /// Mark the cluster reachable or not; while unreachable every
    /// operation fails with `TransportUnavailable`
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
        tracing::info!(reachable, "Local cluster reachability changed");
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Partition owning `key` in `map`
    pub fn partition_for(&self, map: &str, key: &Key) -> usize {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(map.as_bytes());
        hasher.update(&[0]);
        hasher.update(key.as_str().as_bytes());
        hasher.finalize() as usize % self.partitions.len()
    }

    /// Names of maps the cluster has seen writes for
    pub fn map_names(&self) -> Vec<String> {
        self.store.map_names()
    }

    fn ensure_reachable(&self, action: &str, map: &str) -> Result<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(GridError::TransportUnavailable(format!(
                "cluster unreachable during {} on map '{}'",
                action, map
            )))
        }
    }

    fn enqueue(&self, map: &str, key: &Key, mutation: Mutation) {
        let map_name: Arc<str> = Arc::from(map);
        let batch = backup_sweep(&map_name, key, mutation);
        let partition = self.partition_for(map, key);

        if self.partitions[partition].send(batch).is_err() {
            tracing::warn!(partition, "Partition delivery thread is gone");
        }
    }
}

impl Transport for LocalCluster {
    fn raw_mutate(&self, map: &str, key: &Key, value: Option<Bytes>, op: OpKind) -> Result<Ack> {
        self.ensure_reachable(&op.to_string(), map)?;

        // Acquire write lock to serialize mutations
        let _write_guard = self.write_lock.lock();

        let ack = match op {
            OpKind::Put => {
                let value = value.ok_or_else(|| {
                    GridError::Serialization("put requires a value".to_string())
                })?;

                // Step 1: Apply to the primary
                let previous = self.store.put(map, key.clone(), value.clone());

                // Step 2: Sweep backups
                let mutation = if previous.is_some() {
                    Mutation::Overwritten { value }
                } else {
                    Mutation::Inserted { value }
                };
                self.enqueue(map, key, mutation);

                Ack {
                    previous,
                    applied: true,
                }
            }
            OpKind::Remove => match self.store.remove(map, key) {
                Some(previous) => {
                    self.enqueue(
                        map,
                        key,
                        Mutation::Removed {
                            previous: previous.clone(),
                        },
                    );
                    Ack {
                        previous: Some(previous),
                        applied: true,
                    }
                }
                None => Ack::default(),
            },
            OpKind::Evict => match self.store.remove(map, key) {
                Some(previous) => {
                    self.enqueue(map, key, Mutation::Evicted);
                    Ack {
                        previous: Some(previous),
                        applied: true,
                    }
                }
                None => Ack::default(),
            },
        };

        tracing::trace!(map, key = %key, op = %op, applied = ack.applied, "Mutation applied");
        Ok(ack)
    }

    fn raw_get(&self, map: &str, key: &Key) -> Result<Option<Bytes>> {
        self.ensure_reachable("get", map)?;
        Ok(self.store.get(map, key))
    }

    fn raw_clear(&self, map: &str) -> Result<()> {
        self.ensure_reachable("clear", map)?;
        let _write_guard = self.write_lock.lock();
        let dropped = self.store.clear(map);
        tracing::debug!(map, dropped, "Map cleared");
        Ok(())
    }

    fn raw_size(&self, map: &str) -> Result<usize> {
        self.ensure_reachable("size", map)?;
        Ok(self.store.len(map))
    }

    fn raw_query(&self, map: &str, predicate: &CompiledPredicate) -> Result<Vec<(Key, Bytes)>> {
        self.ensure_reachable("query", map)?;

        let mut matched = Vec::new();
        for (key, bytes) in self.store.entries(map) {
            let value = decode_value(&bytes)?;
            if predicate.matches(&value) {
                matched.push((key, bytes));
            }
        }

        tracing::trace!(map, predicate = %predicate, matched = matched.len(), "Query evaluated");
        Ok(matched)
    }

    fn subscribe(&self, sink: Arc<dyn NotificationSink>) {
        self.sinks.write().push(sink);
    }
}
