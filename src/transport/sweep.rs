//! Backup sweep
//!
//! After every primary mutation the cluster walks the remaining lifecycle
//! categories to bring backup replicas in line, emitting one notification
//! per category walked with the entry state at that point.
//!
//! ```text
//! ┌────────────────────┬─────────────────────────────────────┐
//! │ Mutation           │ Notifications (value)               │
//! ├────────────────────┼─────────────────────────────────────┤
//! │ insert V           │ Added(V) Removed(V) Updated(V)      │
//! │                    │ Evicted(-)                          │
//! │ overwrite with V   │ Updated(V) Evicted(-)               │
//! │ remove (was V)     │ Removed(V) Updated(-) Evicted(-)    │
//! │ evict              │ Evicted(-)                          │
//! └────────────────────┴─────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::event::Category;
use crate::key::Key;

use super::RawNotification;

/// A primary mutation that took effect
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Inserted { value: Bytes },
    Overwritten { value: Bytes },
    Removed { previous: Bytes },
    Evicted,
}

/// Notifications produced by one mutation, in delivery order
pub fn backup_sweep(map_name: &Arc<str>, key: &Key, mutation: Mutation) -> Vec<RawNotification> {
    let rows: Vec<(Category, Option<Bytes>)> = match mutation {
        Mutation::Inserted { value } => vec![
            (Category::Added, Some(value.clone())),
            (Category::Removed, Some(value.clone())),
            (Category::Updated, Some(value)),
            (Category::Evicted, None),
        ],
        Mutation::Overwritten { value } => vec![
            (Category::Updated, Some(value)),
            (Category::Evicted, None),
        ],
        Mutation::Removed { previous } => vec![
            (Category::Removed, Some(previous)),
            (Category::Updated, None),
            (Category::Evicted, None),
        ],
        Mutation::Evicted => vec![(Category::Evicted, None)],
    };

    rows.into_iter()
        .map(|(category, value)| RawNotification {
            map_name: Arc::clone(map_name),
            key: key.clone(),
            category,
            value,
        })
        .collect()
}
