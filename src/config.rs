//! Configuration for gridmap
//!
//! Centralized client configuration with sensible defaults.

use std::time::Duration;

use crate::error::{GridError, Result};

/// Main configuration for a gridmap client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------
    /// Name used in log lines and worker thread names
    pub client_name: String,

    // -------------------------------------------------------------------------
    // Local Cluster Configuration
    // -------------------------------------------------------------------------
    /// Number of partitions (and delivery threads) of the in-process cluster.
    /// Every key routes to exactly one partition.
    pub partition_count: usize,

    // -------------------------------------------------------------------------
    // Event Configuration
    // -------------------------------------------------------------------------
    /// Prefix for per-registration listener worker threads
    pub listener_thread_prefix: String,

    /// Default bound for `EventCollector::wait_for` (milliseconds)
    pub event_wait_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: "gridmap".to_string(),
            partition_count: 16,
            listener_thread_prefix: "gridmap-listener".to_string(),
            event_wait_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reject configurations the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.partition_count == 0 {
            return Err(GridError::Config(
                "partition_count must be at least 1".to_string(),
            ));
        }
        if self.client_name.trim().is_empty() {
            return Err(GridError::Config("client_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Default wait bound as a Duration
    pub fn event_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.event_wait_timeout_ms)
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the client name
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Set the number of local cluster partitions
    pub fn partition_count(mut self, count: usize) -> Self {
        self.config.partition_count = count;
        self
    }

    /// Set the listener worker thread prefix
    pub fn listener_thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.listener_thread_prefix = prefix.into();
        self
    }

    /// Set the default event wait bound (in milliseconds)
    pub fn event_wait_timeout_ms(mut self, ms: u64) -> Self {
        self.config.event_wait_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
