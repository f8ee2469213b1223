//! Event bus
//!
//! Registration table plus per-registration delivery workers.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::error::{GridError, Result};
use crate::transport::{NotificationSink, RawNotification};
use crate::value::decode_value;

use super::{Callback, Category, EntryEvent, EntryListener, Listener, RegistrationId};

type Batch = Vec<EntryEvent>;

/// One row of the registration table
struct Registration {
    map_name: String,
    listener: Listener,
    include_value: bool,

    /// Cleared on unregister; workers check it before every delivery
    active: Arc<AtomicBool>,

    /// Sending half of the registration's mailbox
    mailbox: Sender<Batch>,
}

/// Ordered fan-out of entry events
///
/// ## Concurrency:
/// - `registrations`: RwLock (register/unregister write, delivery reads)
/// - each registration has one worker thread draining its mailbox, so
///   deliveries to one registration never overlap while distinct
///   registrations proceed independently
/// - batches are enqueued whole, so a key's sweep is never interleaved
///   with a later batch on the same registration
pub struct EventBus {
    registrations: RwLock<BTreeMap<RegistrationId, Registration>>,

    /// Worker handles, joined by `shutdown`
    workers: Mutex<Vec<JoinHandle<()>>>,

    next_id: AtomicU64,

    /// Isolated listener failures since creation
    failures: Arc<AtomicU64>,

    thread_prefix: String,
}

impl EventBus {
    /// Create an empty bus naming its workers `{thread_prefix}-{id}`
    pub fn new(thread_prefix: impl Into<String>) -> Self {
        Self {
            registrations: RwLock::new(BTreeMap::new()),
            workers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failures: Arc::new(AtomicU64::new(0)),
            thread_prefix: thread_prefix.into(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a listener for every category of `map_name`
    pub fn register_multi(
        &self,
        map_name: &str,
        listener: Arc<dyn EntryListener>,
        include_value: bool,
    ) -> Result<RegistrationId> {
        self.register(map_name, Listener::Multi(listener), include_value)
    }

    /// Register a callback for one category of `map_name`
    ///
    /// Single-category callbacks always receive values.
    pub fn register_single(
        &self,
        map_name: &str,
        category: Category,
        callback: Callback,
    ) -> Result<RegistrationId> {
        self.register(map_name, Listener::Single { category, callback }, true)
    }

    /// Remove a registration. Returns false if it was not registered.
    ///
    /// A delivery already running completes; nothing further is delivered.
    pub fn unregister(&self, id: RegistrationId) -> bool {
        let removed = self.registrations.write().remove(&id);
        match removed {
            Some(registration) => {
                registration.active.store(false, Ordering::Release);
                tracing::debug!(
                    registration = %id,
                    map = %registration.map_name,
                    "Listener unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Number of live registrations across all maps
    pub fn registration_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Number of live registrations on one map
    pub fn registration_count_for(&self, map_name: &str) -> usize {
        self.registrations
            .read()
            .values()
            .filter(|r| r.map_name == map_name)
            .count()
    }

    /// Listener failures isolated so far
    pub fn dispatch_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Drop every registration and wait for the workers to finish
    ///
    /// Must not be called from inside a listener; the calling worker would
    /// be skipped but its siblings still joined.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.registrations.write());
        for registration in drained.values() {
            registration.active.store(false, Ordering::Release);
        }
        drop(drained);

        let current = thread::current().id();
        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("Listener worker panicked outside a handler");
            }
        }
    }

    fn register(
        &self,
        map_name: &str,
        listener: Listener,
        include_value: bool,
    ) -> Result<RegistrationId> {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = channel::unbounded();
        let active = Arc::new(AtomicBool::new(true));

        let worker = DeliveryWorker {
            id,
            listener: listener.clone(),
            active: Arc::clone(&active),
            failures: Arc::clone(&self.failures),
        };
        let handle = thread::Builder::new()
            .name(format!("{}-{}", self.thread_prefix, id.0))
            .spawn(move || worker.run(rx))?;
        {
            let mut workers = self.workers.lock();
            workers.retain(|h| !h.is_finished());
            workers.push(handle);
        }

        tracing::debug!(
            registration = %id,
            map = map_name,
            listener = ?listener,
            include_value,
            "Listener registered"
        );

        self.registrations.write().insert(
            id,
            Registration {
                map_name: map_name.to_string(),
                listener,
                include_value,
                active,
                mailbox: tx,
            },
        );

        Ok(id)
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Turn raw notifications into events, decoding each value once
    fn classify(batch: &[RawNotification]) -> Batch {
        batch
            .iter()
            .map(|raw| {
                let value = raw.value.as_ref().and_then(|bytes| match decode_value(bytes) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(
                            map = %raw.map_name,
                            key = %raw.key,
                            error = %e,
                            "Dropping undecodable event value"
                        );
                        None
                    }
                });
                EntryEvent {
                    map_name: Arc::clone(&raw.map_name),
                    category: raw.category,
                    key: raw.key.clone(),
                    value,
                }
            })
            .collect()
    }

    /// Enqueue one mutation's events on every interested registration
    pub fn publish(&self, events: &[EntryEvent]) {
        if events.is_empty() {
            return;
        }

        let registrations = self.registrations.read();
        for (id, registration) in registrations.iter() {
            let filtered: Batch = events
                .iter()
                .filter(|e| *e.map_name == *registration.map_name)
                .filter(|e| registration.listener.accepts(e.category))
                .map(|e| {
                    let mut event = e.clone();
                    if !registration.include_value {
                        event.value = None;
                    }
                    event
                })
                .collect();

            if filtered.is_empty() {
                continue;
            }

            tracing::trace!(registration = %id, events = filtered.len(), "Enqueued event batch");
            if registration.mailbox.send(filtered).is_err() {
                tracing::debug!(registration = %id, "Mailbox closed, worker gone");
            }
        }
    }
}

impl NotificationSink for EventBus {
    fn deliver(&self, batch: &[RawNotification]) {
        self.publish(&Self::classify(batch));
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        for registration in self.registrations.get_mut().values() {
            registration.active.store(false, Ordering::Release);
        }
    }
}

/// Drains one registration's mailbox
struct DeliveryWorker {
    id: RegistrationId,
    listener: Listener,
    active: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
}

impl DeliveryWorker {
    fn run(self, mailbox: Receiver<Batch>) {
        for batch in mailbox.iter() {
            for event in &batch {
                if !self.active.load(Ordering::Acquire) {
                    return;
                }
                if let Err(e) = self.dispatch(event) {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        category = %event.category,
                        key = %event.key,
                        error = %e,
                        "Listener failed; continuing delivery"
                    );
                }
            }
        }
    }

    /// Invoke the listener, turning errors and panics into ListenerDispatch
    fn dispatch(&self, event: &EntryEvent) -> Result<()> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.listener.invoke(event)));
        let message = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("panicked: {}", reason)
            }
        };
        Err(GridError::ListenerDispatch {
            registration: self.id.0,
            message,
        })
    }
}
