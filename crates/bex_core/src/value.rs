//! Attribute values carried by typed objects.
//!
//! Every attribute of a [`TypedObject`] holds a [`Value`]. The value's
//! [`ValueKind`] is what schema checks compare: a key that starts out as a
//! sequence only ever accepts sequences, a text key only text, and so on.
//! All numbers share one kind, so a template default of `0` accepts `0.5`.

use std::collections::BTreeMap;
use std::fmt;

use bex_math::Vec3;
use serde_json::Value as JsonValue;

use crate::object::{ObjectError, ObjectResult, TypedObject};

/// Keyed attribute storage, ordered by key for deterministic output.
pub type Attributes = BTreeMap<String, Value>;

/// Largest integer a JSON number written as `f64` can carry exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent value. Only appears when parsed from documents; templates reject it.
    Null,

    /// Boolean flag
    Bool(bool),

    /// Any numeric scalar (integers included)
    Number(f64),

    /// String value
    Text(String),

    /// Ordered list of values (numeric arrays, object lists)
    Sequence(Vec<Value>),

    /// Plain nested object, as declared inline by a template
    Map(Attributes),

    /// Nested schema-checked object
    Object(Box<TypedObject>),
}

/// The runtime type of a [`Value`], used for schema checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Text,
    Sequence,
    /// Both [`Value::Map`] and [`Value::Object`]
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Sequence => "sequence",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

impl Value {
    /// The kind this value is checked against.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Map(_) | Value::Object(_) => ValueKind::Object,
        }
    }

    /// Build a numeric sequence from any numeric iterator.
    pub fn numbers<I, N>(values: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<f64>,
    {
        Value::Sequence(values.into_iter().map(|n| Value::Number(n.into())).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&TypedObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True for a sequence with no elements.
    pub fn is_empty_sequence(&self) -> bool {
        matches!(self, Value::Sequence(items) if items.is_empty())
    }

    /// Convert a parsed JSON document into a value.
    ///
    /// Every JSON number becomes [`Value::Number`] and every JSON object a
    /// [`Value::Map`].
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::Sequence(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON, refusing to descend past `depth_left` levels.
    pub(crate) fn to_json_bounded(&self, owner: &str, depth_left: usize) -> ObjectResult<JsonValue> {
        Ok(match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(owner, *n)?,
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Sequence(items) => {
                let next = descend(owner, depth_left)?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json_bounded(owner, next)?);
                }
                JsonValue::Array(out)
            }
            Value::Map(map) => {
                let next = descend(owner, depth_left)?;
                let mut out = serde_json::Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json_bounded(owner, next)?);
                }
                JsonValue::Object(out)
            }
            Value::Object(object) => object.to_json_bounded(descend(owner, depth_left)?)?,
        })
    }
}

fn descend(owner: &str, depth_left: usize) -> ObjectResult<usize> {
    depth_left
        .checked_sub(1)
        .ok_or_else(|| ObjectError::CyclicStructure {
            kind: owner.to_string(),
            limit: crate::object::MAX_NESTING_DEPTH,
        })
}

/// Integral numbers are written without a fractional part. JSON has no
/// NaN or infinity.
fn number_to_json(owner: &str, n: f64) -> ObjectResult<JsonValue> {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        return Ok(JsonValue::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| ObjectError::NonFiniteNumber {
            kind: owner.to_string(),
            value: n,
        })
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Value::numbers(v.to_array())
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::numbers(v)
    }
}

impl From<&[f32]> for Value {
    fn from(values: &[f32]) -> Self {
        Value::numbers(values.iter().copied())
    }
}

impl From<Vec<f32>> for Value {
    fn from(values: Vec<f32>) -> Self {
        Value::numbers(values)
    }
}

impl From<&[u32]> for Value {
    fn from(values: &[u32]) -> Self {
        Value::numbers(values.iter().copied())
    }
}

impl From<Vec<u32>> for Value {
    fn from(values: Vec<u32>) -> Self {
        Value::numbers(values)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Attributes> for Value {
    fn from(map: Attributes) -> Self {
        Value::Map(map)
    }
}

impl From<TypedObject> for Value {
    fn from(object: TypedObject) -> Self {
        Value::Object(Box::new(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Value::from(1.5).kind(), ValueKind::Number);
        assert_eq!(Value::from(3u32).kind(), ValueKind::Number);
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(vec![1.0f32]).kind(), ValueKind::Sequence);
        assert_eq!(Value::Map(Attributes::new()).kind(), ValueKind::Object);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"a": [1, 2.5], "b": "text", "c": {"d": true}});
        let value = Value::from_json(&json);
        let map = value.as_map().unwrap();

        assert_eq!(
            map["a"],
            Value::Sequence(vec![Value::Number(1.0), Value::Number(2.5)])
        );
        assert_eq!(map["b"].as_text(), Some("text"));
        assert_eq!(map["c"].as_map().unwrap()["d"].as_bool(), Some(true));
    }

    #[test]
    fn test_integral_numbers_written_as_integers() {
        let json = Value::numbers([1.0, 2.5, -3.0]).to_json_bounded("test", 4).unwrap();
        assert_eq!(json.to_string(), "[1,2.5,-3]");
    }

    #[test]
    fn test_non_finite_number_is_an_error() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Value::Number(n).to_json_bounded("light", 4),
                Err(ObjectError::NonFiniteNumber { .. })
            ));
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::Sequence(vec![]);
        for _ in 0..3 {
            value = Value::Sequence(vec![value]);
        }

        assert!(value.to_json_bounded("test", 4).is_ok());
        assert!(matches!(
            value.to_json_bounded("test", 3),
            Err(ObjectError::CyclicStructure { .. })
        ));
    }
}
