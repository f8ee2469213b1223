//! Event collector
//!
//! An [`EntryListener`] that records what it receives and lets the caller
//! block until enough events arrived, with a deadline.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{EntryEvent, EntryListener, ListenerResult};

/// Records delivered events in arrival order
#[derive(Default)]
pub struct EventCollector {
    label: Option<String>,
    events: Mutex<Vec<EntryEvent>>,
    arrived: Condvar,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector whose `lines()` carry a `[label] ` prefix
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Append an event and wake waiters
    ///
    /// Usable from single-category callbacks that share a collector.
    pub fn record(&self, event: &EntryEvent) {
        self.events.lock().push(event.clone());
        self.arrived.notify_all();
    }

    /// Block until at least `count` events were recorded or `timeout` passed
    ///
    /// Returns everything recorded so far either way.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<EntryEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        while events.len() < count {
            if self.arrived.wait_until(&mut events, deadline).timed_out() {
                break;
            }
        }
        events.clone()
    }

    pub fn snapshot(&self) -> Vec<EntryEvent> {
        self.events.lock().clone()
    }

    /// Events rendered as `[label] <category> : <key> : <value>`
    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| match &self.label {
                Some(label) => format!("[{}] {}", label, e),
                None => e.to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EntryListener for EventCollector {
    fn entry_added(&self, event: &EntryEvent) -> ListenerResult {
        self.record(event);
        Ok(())
    }

    fn entry_removed(&self, event: &EntryEvent) -> ListenerResult {
        self.record(event);
        Ok(())
    }

    fn entry_updated(&self, event: &EntryEvent) -> ListenerResult {
        self.record(event);
        Ok(())
    }

    fn entry_evicted(&self, event: &EntryEvent) -> ListenerResult {
        self.record(event);
        Ok(())
    }
}
