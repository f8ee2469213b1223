//! Key Module
//!
//! Canonical keys and the heterogeneous inputs they are built from.
//!
//! ## Responsibilities
//! - One comparable representation for every key the client sends
//! - Logically-equal inputs of different native types collide
//!   (`4`, `"4"` and `4.0` are the same key)
//! - Caller-registered rules for custom key types
//!
//! ## Canonical Forms
//! ```text
//! ┌──────────────────────┬──────────────────────────────┐
//! │ Input                │ Canonical text               │
//! ├──────────────────────┼──────────────────────────────┤
//! │ &str / String        │ unchanged                    │
//! │ symbol               │ unchanged                    │
//! │ integer              │ base-10 ("-12")              │
//! │ float                │ shortest base-10 ("2.5")     │
//! │ NaiveDate            │ YYYY-MM-DD                   │
//! │ NaiveDateTime        │ YYYY-MM-DDTHH:MM:SS[.f]      │
//! │ DateTime<Utc>        │ RFC 3339 with Z              │
//! │ custom               │ registered rule              │
//! └──────────────────────┴──────────────────────────────┘
//! ```

mod codec;

pub use codec::KeyCodec;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A canonical key
///
/// Only produced by [`KeyCodec`] (or by a transport echoing keys it was
/// given), so two equal keys always came from logically-equal inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Key {
    /// Wrap text that is already in canonical form
    pub fn from_canonical(text: impl Into<Arc<str>>) -> Self {
        Key(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A key value before canonicalization
#[derive(Debug)]
pub enum KeyLike {
    Str(String),
    Symbol(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    UtcDateTime(DateTime<Utc>),
    Custom(CustomKey),
}

impl KeyLike {
    /// A symbol-like key (interned name); canonicalizes like a string
    pub fn symbol(name: impl Into<String>) -> Self {
        KeyLike::Symbol(name.into())
    }

    /// A key of a caller-defined type; needs a rule registered on the codec
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        KeyLike::Custom(CustomKey::new(value))
    }
}

/// Type-erased caller-defined key value
pub struct CustomKey {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl CustomKey {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        self.value.as_ref()
    }
}

impl fmt::Debug for CustomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomKey")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for KeyLike {
    fn from(value: &str) -> Self {
        KeyLike::Str(value.to_string())
    }
}

impl From<String> for KeyLike {
    fn from(value: String) -> Self {
        KeyLike::Str(value)
    }
}

impl From<&String> for KeyLike {
    fn from(value: &String) -> Self {
        KeyLike::Str(value.clone())
    }
}

impl From<Key> for KeyLike {
    fn from(value: Key) -> Self {
        KeyLike::Str(value.as_str().to_string())
    }
}

impl From<&Key> for KeyLike {
    fn from(value: &Key) -> Self {
        KeyLike::Str(value.as_str().to_string())
    }
}

macro_rules! signed_key {
    ($($ty:ty),*) => {
        $(impl From<$ty> for KeyLike {
            fn from(value: $ty) -> Self {
                KeyLike::Int(value as i64)
            }
        })*
    };
}

macro_rules! unsigned_key {
    ($($ty:ty),*) => {
        $(impl From<$ty> for KeyLike {
            fn from(value: $ty) -> Self {
                KeyLike::UInt(value as u64)
            }
        })*
    };
}

signed_key!(i8, i16, i32, i64, isize);
unsigned_key!(u8, u16, u32, u64, usize);

impl From<f32> for KeyLike {
    fn from(value: f32) -> Self {
        KeyLike::Float(value as f64)
    }
}

impl From<f64> for KeyLike {
    fn from(value: f64) -> Self {
        KeyLike::Float(value)
    }
}

impl From<NaiveDate> for KeyLike {
    fn from(value: NaiveDate) -> Self {
        KeyLike::Date(value)
    }
}

impl From<NaiveDateTime> for KeyLike {
    fn from(value: NaiveDateTime) -> Self {
        KeyLike::DateTime(value)
    }
}

impl From<DateTime<Utc>> for KeyLike {
    fn from(value: DateTime<Utc>) -> Self {
        KeyLike::UtcDateTime(value)
    }
}
