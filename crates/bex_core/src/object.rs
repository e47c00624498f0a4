//! Schema-checked objects.
//!
//! A [`TypedObject`] is a flat key/value record instantiated from one named
//! template. Its key set is fixed at construction: values can be replaced
//! only by values of the same [`ValueKind`], and the key set only changes
//! through the explicit [`TypedObject::promote`] and [`TypedObject::retract`]
//! operations.

use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::value::{Attributes, Value, ValueKind};

/// How deep nested objects and sequences may go before serialization
/// treats the structure as cyclic.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Errors raised by typed object access.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    #[error("'{kind}' has no attribute '{key}'")]
    UnknownKey { kind: String, key: String },

    #[error("wrong type for '{kind}.{key}': expected {expected}, found {found}")]
    TypeMismatch {
        kind: String,
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("'{kind}' nests deeper than {limit} levels, refusing to serialize a cyclic structure")]
    CyclicStructure { kind: String, limit: usize },

    #[error("'{kind}' holds {value}, which JSON cannot represent")]
    NonFiniteNumber { kind: String, value: f64 },

    #[error("failed to format '{kind}' as JSON: {message}")]
    Format { kind: String, message: String },
}

/// Result type for typed object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

/// An instance of one schema kind.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedObject {
    kind: String,
    attributes: Attributes,
}

impl TypedObject {
    /// Create an object from a template. The template is deep-copied.
    pub(crate) fn from_template(kind: impl Into<String>, template: &Attributes) -> Self {
        Self {
            kind: kind.into(),
            attributes: template.clone(),
        }
    }

    /// The schema kind this object was instantiated from.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Read an attribute.
    pub fn get(&self, key: &str) -> ObjectResult<&Value> {
        self.attributes
            .get(key)
            .ok_or_else(|| self.unknown_key(key))
    }

    /// Replace an attribute, keeping its kind.
    ///
    /// Fails with [`ObjectError::UnknownKey`] if the key is not declared and
    /// [`ObjectError::TypeMismatch`] if the new value has a different kind.
    /// The object is left untouched on failure.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ObjectResult<()> {
        let value = value.into();
        let kind = self.kind.clone();
        let slot = self
            .attributes
            .get_mut(key)
            .ok_or_else(|| ObjectError::UnknownKey {
                kind: kind.clone(),
                key: key.to_string(),
            })?;

        if slot.kind() != value.kind() {
            return Err(ObjectError::TypeMismatch {
                kind,
                key: key.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }

        *slot = value;
        Ok(())
    }

    /// Move the value stored under `key` to `new_key`.
    ///
    /// This is the only way to introduce a key the template did not declare.
    /// An existing `new_key` is overwritten.
    pub fn promote(&mut self, key: &str, new_key: &str) -> ObjectResult<()> {
        let value = self
            .attributes
            .remove(key)
            .ok_or_else(|| self.unknown_key(key))?;
        self.attributes.insert(new_key.to_string(), value);
        Ok(())
    }

    /// Store a value the crate itself owns under `key`, whether or not the
    /// template declares it. An existing value is replaced regardless of
    /// kind.
    pub(crate) fn attach_reserved(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Remove a key entirely and return its value.
    pub fn retract(&mut self, key: &str) -> ObjectResult<Value> {
        self.attributes
            .remove(key)
            .ok_or_else(|| self.unknown_key(key))
    }

    /// Mutable access to a sequence attribute.
    ///
    /// Elements may be added or replaced; the attribute stays a sequence.
    pub fn sequence_mut(&mut self, key: &str) -> ObjectResult<&mut Vec<Value>> {
        let kind = self.kind.clone();
        match self.attributes.get_mut(key) {
            Some(Value::Sequence(items)) => Ok(items),
            Some(other) => Err(ObjectError::TypeMismatch {
                kind,
                key: key.to_string(),
                expected: ValueKind::Sequence,
                found: other.kind(),
            }),
            None => Err(ObjectError::UnknownKey {
                kind,
                key: key.to_string(),
            }),
        }
    }

    /// Mutable access to a plain nested object attribute.
    pub fn map_mut(&mut self, key: &str) -> ObjectResult<&mut Attributes> {
        let kind = self.kind.clone();
        match self.attributes.get_mut(key) {
            Some(Value::Map(map)) => Ok(map),
            Some(other) => Err(ObjectError::TypeMismatch {
                kind,
                key: key.to_string(),
                expected: ValueKind::Object,
                found: other.kind(),
            }),
            None => Err(ObjectError::UnknownKey {
                kind,
                key: key.to_string(),
            }),
        }
    }

    /// Read a text attribute.
    pub fn get_text(&self, key: &str) -> ObjectResult<&str> {
        let value = self.get(key)?;
        value.as_text().ok_or_else(|| self.mismatch(key, ValueKind::Text, value))
    }

    /// Read a numeric attribute.
    pub fn get_number(&self, key: &str) -> ObjectResult<f64> {
        let value = self.get(key)?;
        value
            .as_number()
            .ok_or_else(|| self.mismatch(key, ValueKind::Number, value))
    }

    /// The object's identifier: `id` if set, otherwise `name`.
    pub fn identifier(&self) -> Option<&str> {
        ["id", "name"]
            .iter()
            .filter_map(|key| self.attributes.get(*key).and_then(Value::as_text))
            .find(|s| !s.is_empty())
    }

    /// Serialize the current state into a JSON document.
    pub fn to_json(&self) -> ObjectResult<JsonValue> {
        self.to_json_bounded(MAX_NESTING_DEPTH)
    }

    /// Pretty-printed JSON text.
    pub fn to_json_string(&self) -> ObjectResult<String> {
        let json = self.to_json()?;
        serde_json::to_string_pretty(&json).map_err(|e| ObjectError::Format {
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }

    pub(crate) fn to_json_bounded(&self, depth_left: usize) -> ObjectResult<JsonValue> {
        let mut out = serde_json::Map::new();
        for (key, value) in &self.attributes {
            out.insert(key.clone(), value.to_json_bounded(&self.kind, depth_left)?);
        }
        Ok(JsonValue::Object(out))
    }

    fn unknown_key(&self, key: &str) -> ObjectError {
        ObjectError::UnknownKey {
            kind: self.kind.clone(),
            key: key.to_string(),
        }
    }

    fn mismatch(&self, key: &str, expected: ValueKind, found: &Value) -> ObjectError {
        ObjectError::TypeMismatch {
            kind: self.kind.clone(),
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

impl fmt::Display for TypedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json_string() {
            Ok(text) => f.write_str(&text),
            Err(e) => write!(f, "<{}: {}>", self.kind, e),
        }
    }
}
