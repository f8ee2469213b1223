//! Listener capability
//!
//! One trait with four handler slots. A registration holds either a
//! multi-category listener or a callback bound to one category.

use std::fmt;
use std::sync::Arc;

use super::{Category, EntryEvent};

/// Outcome of a handler; errors are logged and isolated by the bus
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Single-category callback
pub type Callback = Arc<dyn Fn(&EntryEvent) -> ListenerResult + Send + Sync>;

/// Multi-category listener; every slot defaults to a no-op
pub trait EntryListener: Send + Sync {
    fn entry_added(&self, _event: &EntryEvent) -> ListenerResult {
        Ok(())
    }

    fn entry_removed(&self, _event: &EntryEvent) -> ListenerResult {
        Ok(())
    }

    fn entry_updated(&self, _event: &EntryEvent) -> ListenerResult {
        Ok(())
    }

    fn entry_evicted(&self, _event: &EntryEvent) -> ListenerResult {
        Ok(())
    }
}

/// What a registration delivers to
#[derive(Clone)]
pub enum Listener {
    Multi(Arc<dyn EntryListener>),
    Single { category: Category, callback: Callback },
}

impl Listener {
    /// Whether events of `category` reach this listener
    pub fn accepts(&self, category: Category) -> bool {
        match self {
            Listener::Multi(_) => true,
            Listener::Single { category: wanted, .. } => *wanted == category,
        }
    }

    /// Route an event to the matching slot
    pub fn invoke(&self, event: &EntryEvent) -> ListenerResult {
        match self {
            Listener::Multi(listener) => match event.category {
                Category::Added => listener.entry_added(event),
                Category::Removed => listener.entry_removed(event),
                Category::Updated => listener.entry_updated(event),
                Category::Evicted => listener.entry_evicted(event),
            },
            Listener::Single { category, callback } if *category == event.category => {
                callback(event)
            }
            Listener::Single { .. } => Ok(()),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Multi(_) => f.write_str("Listener::Multi"),
            Listener::Single { category, .. } => write!(f, "Listener::Single({})", category),
        }
    }
}
