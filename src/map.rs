//! Map Module
//!
//! The façade callers use for one named map.
//!
//! ## Responsibilities
//! - Canonicalize every key argument before it reaches the transport
//! - Encode/decode values at the transport boundary
//! - Compile criteria before querying
//! - Register listeners scoped to this map

use std::sync::Arc;

use bytes::Bytes;

use crate::client::ClientInner;
use crate::error::Result;
use crate::event::{Category, EntryEvent, EntryListener, ListenerResult, RegistrationId};
use crate::key::{Key, KeyLike};
use crate::query::{CompiledPredicate, Criteria};
use crate::transport::OpKind;
use crate::value::{decode_value, encode_value, Value};

/// Handle for one named map
///
/// Cheap to clone. Canonicalization and compilation errors are returned
/// before anything is sent; transport errors are returned unchanged.
#[derive(Clone)]
pub struct MapHandle {
    name: Arc<str>,
    inner: Arc<ClientInner>,
}

impl MapHandle {
    pub(crate) fn new(name: String, inner: Arc<ClientInner>) -> Self {
        Self {
            name: Arc::from(name),
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Get the value stored under `key`
    pub fn get(&self, key: impl Into<KeyLike>) -> Result<Option<Value>> {
        let key = self.key(key)?;
        let bytes = self.inner.transport.raw_get(&self.name, &key)?;
        decode_optional(bytes)
    }

    /// Store `value` under `key`; returns the previous value
    pub fn put(&self, key: impl Into<KeyLike>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = self.key(key)?;
        let encoded = encode_value(&value.into())?;
        let ack = self
            .inner
            .transport
            .raw_mutate(&self.name, &key, Some(encoded), OpKind::Put)?;
        decode_optional(ack.previous)
    }

    /// Remove `key`; returns the removed value
    pub fn remove(&self, key: impl Into<KeyLike>) -> Result<Option<Value>> {
        let key = self.key(key)?;
        let ack = self
            .inner
            .transport
            .raw_mutate(&self.name, &key, None, OpKind::Remove)?;
        decode_optional(ack.previous)
    }

    /// Evict `key`; returns false if it was not present
    pub fn evict(&self, key: impl Into<KeyLike>) -> Result<bool> {
        let key = self.key(key)?;
        let ack = self
            .inner
            .transport
            .raw_mutate(&self.name, &key, None, OpKind::Evict)?;
        Ok(ack.applied)
    }

    /// Remove every entry. Emits no entry events.
    pub fn clear(&self) -> Result<()> {
        self.inner.transport.raw_clear(&self.name)
    }

    pub fn contains_key(&self, key: impl Into<KeyLike>) -> Result<bool> {
        let key = self.key(key)?;
        Ok(self.inner.transport.raw_get(&self.name, &key)?.is_some())
    }

    pub fn size(&self) -> Result<usize> {
        self.inner.transport.raw_size(&self.name)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Compile criteria without running them
    pub fn prepare_predicate(&self, criteria: impl Into<Criteria>) -> Result<CompiledPredicate> {
        self.inner.compiler.compile(criteria)
    }

    /// Entries matching `criteria`, in key order
    pub fn query(&self, criteria: impl Into<Criteria>) -> Result<Vec<(Key, Value)>> {
        let predicate = self.prepare_predicate(criteria)?;
        self.query_compiled(&predicate)
    }

    /// Entries matching an already compiled predicate
    pub fn query_compiled(&self, predicate: &CompiledPredicate) -> Result<Vec<(Key, Value)>> {
        self.inner
            .transport
            .raw_query(&self.name, predicate)?
            .into_iter()
            .map(|(key, bytes)| decode_value(&bytes).map(|value| (key, value)))
            .collect()
    }

    pub fn keys(&self, criteria: impl Into<Criteria>) -> Result<Vec<Key>> {
        Ok(self.query(criteria)?.into_iter().map(|(k, _)| k).collect())
    }

    pub fn values(&self, criteria: impl Into<Criteria>) -> Result<Vec<Value>> {
        Ok(self.query(criteria)?.into_iter().map(|(_, v)| v).collect())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a listener for every category of this map
    pub fn add_entry_listener(
        &self,
        listener: Arc<dyn EntryListener>,
        include_value: bool,
    ) -> Result<RegistrationId> {
        self.inner
            .bus
            .register_multi(&self.name, listener, include_value)
    }

    pub fn on_entry_added<F>(&self, callback: F) -> Result<RegistrationId>
    where
        F: Fn(&EntryEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_entry(Category::Added, callback)
    }

    pub fn on_entry_removed<F>(&self, callback: F) -> Result<RegistrationId>
    where
        F: Fn(&EntryEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_entry(Category::Removed, callback)
    }

    pub fn on_entry_updated<F>(&self, callback: F) -> Result<RegistrationId>
    where
        F: Fn(&EntryEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_entry(Category::Updated, callback)
    }

    pub fn on_entry_evicted<F>(&self, callback: F) -> Result<RegistrationId>
    where
        F: Fn(&EntryEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.on_entry(Category::Evicted, callback)
    }

    /// Register a callback for one category of this map
    pub fn on_entry<F>(&self, category: Category, callback: F) -> Result<RegistrationId>
    where
        F: Fn(&EntryEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.inner
            .bus
            .register_single(&self.name, category, Arc::new(callback))
    }

    pub fn remove_entry_listener(&self, id: RegistrationId) -> bool {
        self.inner.bus.unregister(id)
    }

    fn key(&self, key: impl Into<KeyLike>) -> Result<Key> {
        self.inner.codec.canonicalize(key)
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle").field("name", &self.name).finish()
    }
}

fn decode_optional(bytes: Option<Bytes>) -> Result<Option<Value>> {
    bytes.map(|b| decode_value(&b)).transpose()
}
