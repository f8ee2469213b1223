//! Value codec
//!
//! Encoding and decoding of values for the transport.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────────────────────────┐
//! │ bincode(Value)                       │
//! │ (enum tag u32 LE + variant payload)  │
//! └──────────────────────────────────────┘
//! ```

use bytes::Bytes;

use crate::error::{GridError, Result};

use super::Value;

/// Maximum encoded value size (16 MB)
pub const MAX_VALUE_SIZE: usize = 16 * 1024 * 1024;

/// Encode a value to bytes
pub fn encode_value(value: &Value) -> Result<Bytes> {
    let encoded = bincode::serialize(value)
        .map_err(|e| GridError::Serialization(format!("Failed to encode value: {}", e)))?;

    if encoded.len() > MAX_VALUE_SIZE {
        return Err(GridError::Serialization(format!(
            "Value too large: {} bytes (max {})",
            encoded.len(),
            MAX_VALUE_SIZE
        )));
    }

    Ok(Bytes::from(encoded))
}

/// Decode a value from bytes
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    if bytes.len() > MAX_VALUE_SIZE {
        return Err(GridError::Serialization(format!(
            "Value too large: {} bytes (max {})",
            bytes.len(),
            MAX_VALUE_SIZE
        )));
    }

    bincode::deserialize(bytes)
        .map_err(|e| GridError::Serialization(format!("Failed to decode value: {}", e)))
}
