//! Event Module
//!
//! Entry lifecycle events and their ordered, asynchronous fan-out.
//!
//! ## Responsibilities
//! - Register multi-category listeners and single-category callbacks
//! - Classify raw transport notifications into [`EntryEvent`]s
//! - Deliver each mutation's notification batch to every interested
//!   registration as one unit, preserving per-key order
//! - Isolate listener failures
//!
//! ## Delivery Path
//! ```text
//!  transport feed (per-partition threads)
//!          │  batch = one mutation's backup sweep
//!          ▼
//!  ┌───────────────┐  read lock   ┌──────────────────┐
//!  │   EventBus    │─────────────►│ registration tbl │
//!  └───────┬───────┘              └──────────────────┘
//!          │ filtered batch per registration
//!    ┌─────┴─────┬───────────┐
//!    ▼           ▼           ▼
//!  mailbox     mailbox     mailbox     (crossbeam channel each)
//!    │           │           │
//!  worker      worker      worker      (one thread per registration)
//! ```

mod bus;
mod collector;
mod listener;

pub use bus::EventBus;
pub use collector::EventCollector;
pub use listener::{Callback, EntryListener, Listener, ListenerResult};

use std::fmt;
use std::sync::Arc;

use crate::key::Key;
use crate::value::Value;

/// Entry lifecycle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Added,
    Removed,
    Updated,
    Evicted,
}

impl Category {
    /// All categories in sweep order
    pub const ALL: [Category; 4] = [
        Category::Added,
        Category::Removed,
        Category::Updated,
        Category::Evicted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Added => "added",
            Category::Removed => "removed",
            Category::Updated => "updated",
            Category::Evicted => "evicted",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivered entry event
#[derive(Debug, Clone, PartialEq)]
pub struct EntryEvent {
    pub map_name: Arc<str>,
    pub category: Category,
    pub key: Key,
    /// None when the entry state carries no value at this point of the
    /// sweep, or when the registration excluded values
    pub value: Option<Value>,
}

impl EntryEvent {
    /// The value rendered as text, empty when absent
    pub fn value_text(&self) -> String {
        self.value.as_ref().map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Renders as `<category> : <key> : <value>`
impl fmt::Display for EntryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {} : {}", self.category, self.key, self.value_text())
    }
}

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub(crate) u64);

impl RegistrationId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
