//! Transport Module
//!
//! The boundary to the clustered store the client talks to.
//!
//! ## Responsibilities
//! - [`Transport`]: mutations, reads and queries issued by map handles
//! - [`NotificationSink`]: the feed of raw mutation notifications
//! - [`LocalCluster`]: an in-process implementation of both sides
//!
//! Values cross this boundary as encoded bytes; keys are already canonical.

mod local;
mod store;
mod sweep;

pub use local::LocalCluster;
pub use store::EntryStore;
pub use sweep::{backup_sweep, Mutation};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::event::Category;
use crate::key::Key;
use crate::query::CompiledPredicate;

/// Kind of a keyed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Put,
    Remove,
    Evict,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Put => "put",
            OpKind::Remove => "remove",
            OpKind::Evict => "evict",
        };
        f.write_str(name)
    }
}

/// Primary acknowledgement of a mutation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ack {
    /// Value held before the mutation
    pub previous: Option<Bytes>,

    /// False when the mutation found nothing to act on
    /// (remove/evict of an absent key)
    pub applied: bool,
}

/// One notification of the subscription feed
#[derive(Debug, Clone, PartialEq)]
pub struct RawNotification {
    pub map_name: Arc<str>,
    pub key: Key,
    pub category: Category,
    pub value: Option<Bytes>,
}

/// Consumer of the notification feed
///
/// `deliver` receives all notifications one mutation produced, in order.
/// Batches for the same key arrive in mutation order.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, batch: &[RawNotification]);
}

/// The clustered store, as seen by the client
///
/// Failures to reach the cluster surface as `TransportUnavailable`; the
/// client never retries them.
pub trait Transport: Send + Sync {
    /// Issue a keyed mutation; returns once the primary acknowledged it
    fn raw_mutate(&self, map: &str, key: &Key, value: Option<Bytes>, op: OpKind) -> Result<Ack>;

    fn raw_get(&self, map: &str, key: &Key) -> Result<Option<Bytes>>;

    /// Remove every entry without emitting notifications
    fn raw_clear(&self, map: &str) -> Result<()>;

    fn raw_size(&self, map: &str) -> Result<usize>;

    fn raw_query(&self, map: &str, predicate: &CompiledPredicate) -> Result<Vec<(Key, Bytes)>>;

    /// Attach a consumer to the notification feed
    fn subscribe(&self, sink: Arc<dyn NotificationSink>);
}
