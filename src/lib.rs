//! # gridmap
//!
//! Client library for a clustered, replicated key/value map with:
//! - Key canonicalization across heterogeneous key types
//! - A small predicate language (`=`, `AND`, `OR`, grouping) compiled to
//!   canonical text
//! - Ordered, asynchronous entry lifecycle events with backup-sweep
//!   amplification
//! - An in-process cluster for tests and local use
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Caller                              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       MapHandle                             │
//! └──────┬──────────────────────┬───────────────────────────────┘
//!        │                      │
//!        ▼                      ▼
//! ┌─────────────┐        ┌─────────────┐
//! │  KeyCodec   │        │  Predicate  │
//! │             │        │  Compiler   │
//! └──────┬──────┘        └──────┬──────┘
//!        └──────────┬───────────┘
//!                   ▼
//!        ┌─────────────────────┐   notification   ┌─────────────┐
//!        │      Transport      │─────batches─────►│  EventBus   │──► listeners
//!        │   (LocalCluster)    │                  └─────────────┘
//!        └─────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod logging;

pub mod key;
pub mod value;
pub mod query;
pub mod event;
pub mod transport;
pub mod map;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GridError, Result};
pub use config::ClientConfig;
pub use client::Client;
pub use event::{Category, EntryEvent, EntryListener, EventBus, EventCollector, RegistrationId};
pub use key::{Key, KeyCodec, KeyLike};
pub use map::MapHandle;
pub use query::{CompiledPredicate, Criteria, Literal, PredicateCompiler};
pub use transport::{LocalCluster, Transport};
pub use value::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gridmap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
