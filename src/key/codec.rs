//! Key canonicalization
//!
//! Pure, reentrant mapping from [`KeyLike`] to [`Key`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::SecondsFormat;

use crate::error::{GridError, Result};

use super::{Key, KeyLike};

type Rule = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<String> + Send + Sync>;

/// Canonicalizes keys
///
/// Holds no mutable state once shared: rules are registered up front, and
/// `canonicalize` only reads them.
#[derive(Clone, Default)]
pub struct KeyCodec {
    rules: HashMap<TypeId, Rule>,
}

impl KeyCodec {
    /// Create a codec with only the built-in rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canonicalization rule for a custom key type
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register<T, F>(&mut self, rule: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let erased: Rule = Arc::new(move |value: &(dyn Any + Send + Sync)| {
            value.downcast_ref::<T>().map(|typed| rule(typed))
        });
        self.rules.insert(TypeId::of::<T>(), erased);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_rule<T, F>(mut self, rule: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.register::<T, F>(rule);
        self
    }

    /// Whether a rule exists for `T`
    pub fn has_rule<T: Any>(&self) -> bool {
        self.rules.contains_key(&TypeId::of::<T>())
    }

    /// Canonicalize any key input
    pub fn canonicalize(&self, key: impl Into<KeyLike>) -> Result<Key> {
        let text = match key.into() {
            KeyLike::Str(s) | KeyLike::Symbol(s) => s,
            KeyLike::Int(n) => n.to_string(),
            KeyLike::UInt(n) => n.to_string(),
            KeyLike::Float(f) => canonical_float(f)?,
            KeyLike::Date(d) => d.format("%Y-%m-%d").to_string(),
            KeyLike::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            KeyLike::UtcDateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            KeyLike::Custom(custom) => {
                let rule = self.rules.get(&custom.type_id()).ok_or_else(|| {
                    GridError::UnsupportedKeyType(format!(
                        "no canonicalization rule registered for {}",
                        custom.type_name()
                    ))
                })?;
                rule(custom.value()).ok_or_else(|| {
                    GridError::UnsupportedKeyType(format!(
                        "rule for {} rejected its input",
                        custom.type_name()
                    ))
                })?
            }
        };

        Ok(Key::from_canonical(text))
    }
}

impl fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCodec")
            .field("custom_rules", &self.rules.len())
            .finish()
    }
}

/// Floats with no fractional part render like integers; -0.0 is 0.
fn canonical_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(GridError::UnsupportedKeyType(format!(
            "non-finite float key {}",
            value
        )));
    }
    if value == 0.0 {
        return Ok("0".to_string());
    }
    Ok(value.to_string())
}
