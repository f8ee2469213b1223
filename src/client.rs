//! Client
//!
//! Owns the codec, compiler, event bus and transport shared by every map
//! handle it hands out. Callers pass the client (or its handles) around
//! explicitly; there is no process-wide instance.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::event::EventBus;
use crate::key::KeyCodec;
use crate::map::MapHandle;
use crate::query::PredicateCompiler;
use crate::transport::{LocalCluster, NotificationSink, Transport};

/// State shared by a client and its map handles
pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) codec: KeyCodec,
    pub(crate) compiler: PredicateCompiler,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) transport: Arc<dyn Transport>,
}

/// Entry point of the library
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Connect to `transport` with the built-in key rules
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_key_codec(config, KeyCodec::new(), transport)
    }

    /// Connect with a codec carrying caller-registered key rules
    pub fn with_key_codec(
        config: ClientConfig,
        codec: KeyCodec,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(EventBus::new(config.listener_thread_prefix.clone()));
        transport.subscribe(Arc::clone(&bus) as Arc<dyn NotificationSink>);

        tracing::info!(client = %config.client_name, "Client started");

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                codec,
                compiler: PredicateCompiler::new(),
                bus,
                transport,
            }),
        })
    }

    /// Start a client over a fresh [`LocalCluster`]
    pub fn local(config: ClientConfig) -> Result<Self> {
        let cluster = LocalCluster::new(&config)?;
        Self::new(config, cluster)
    }

    /// Handle for the map called `name`
    ///
    /// Handles for the same name share entries and listeners.
    pub fn map(&self, name: impl Into<String>) -> MapHandle {
        MapHandle::new(name.into(), Arc::clone(&self.inner))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Codec applied to every key argument, custom rules included
    pub fn codec(&self) -> &KeyCodec {
        &self.inner.codec
    }

    /// Compiler behind `MapHandle::prepare_predicate` and `query`
    pub fn compiler(&self) -> &PredicateCompiler {
        &self.inner.compiler
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Unregister every listener and join their workers
    pub fn shutdown(&self) {
        self.inner.bus.shutdown();
        tracing::info!(client = %self.inner.config.client_name, "Client stopped");
    }
}
