//! Error types for gridmap
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using GridError
pub type Result<T> = std::result::Result<T, GridError>;

/// Unified error type for gridmap operations
#[derive(Debug, Error)]
pub enum GridError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    // -------------------------------------------------------------------------
    // Predicate Errors
    // -------------------------------------------------------------------------
    #[error("Predicate syntax error at offset {offset}: unexpected {token:?}")]
    PredicateSyntax { token: String, offset: usize },

    // -------------------------------------------------------------------------
    // Listener Errors
    // -------------------------------------------------------------------------
    #[error("Listener {registration} failed: {message}")]
    ListenerDispatch { registration: u64, message: String },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GridError {
    /// Build a syntax error for the token found at `offset`
    pub(crate) fn syntax(token: impl Into<String>, offset: usize) -> Self {
        GridError::PredicateSyntax {
            token: token.into(),
            offset,
        }
    }
}
