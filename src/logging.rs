//! Logging bootstrap
//!
//! The library only emits `tracing` events. Applications and tests that want
//! them printed call [`init`] once; later calls are no-ops.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,gridmap=debug";

/// Install a global fmt subscriber honoring `RUST_LOG`
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    init_with_filter(DEFAULT_FILTER)
}

/// Install a global fmt subscriber with an explicit fallback filter
pub fn init_with_filter(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_test_writer()
        .try_init()
        .is_ok()
}
