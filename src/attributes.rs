// 🏛️ Attribute Layer - typed scalar values
//
// Every attribute an entity carries is one of three scalar types.
// The type of a declared field is fixed once in its FieldSpec; the type of an
// extra (undeclared) attribute is fixed by its first assignment.

use crate::error::{StoreError, StoreResult};
use serde::Deserialize;
use std::fmt;

// ============================================================================
// ATTRIBUTE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Text,
    Integer,
    Float,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Text => "text",
            AttributeType::Integer => "integer",
            AttributeType::Float => "float",
        }
    }

    /// Parse a raw command-line string into a value of this type
    ///
    /// No fallback: a string that does not parse is rejected, it is never
    /// stored as text in place of a number.
    pub fn coerce(&self, attribute: &str, raw: &str) -> StoreResult<AttributeValue> {
        match self {
            AttributeType::Text => Ok(AttributeValue::Text(raw.to_string())),
            AttributeType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|_| {
                    StoreError::invalid_value(attribute, format!("expected integer, got {:?}", raw))
                }),
            AttributeType::Float => {
                let parsed = raw.trim().parse::<f64>().map_err(|_| {
                    StoreError::invalid_value(attribute, format!("expected float, got {:?}", raw))
                })?;
                AttributeType::Float.conform(attribute, AttributeValue::Float(parsed))
            }
        }
    }

    /// Check an already-typed value against this type
    ///
    /// Integers widen to floats; nothing else converts.
    pub fn conform(&self, attribute: &str, value: AttributeValue) -> StoreResult<AttributeValue> {
        match (self, value) {
            (AttributeType::Text, v @ AttributeValue::Text(_)) => Ok(v),
            (AttributeType::Integer, v @ AttributeValue::Integer(_)) => Ok(v),
            (AttributeType::Float, AttributeValue::Integer(i)) => Ok(AttributeValue::Float(i as f64)),
            (AttributeType::Float, AttributeValue::Float(f)) if !f.is_finite() => Err(
                StoreError::invalid_value(attribute, "float must be finite"),
            ),
            (AttributeType::Float, v @ AttributeValue::Float(_)) => Ok(v),
            (expected, other) => Err(StoreError::invalid_value(
                attribute,
                format!("expected {}, got {}", expected.as_str(), other.attribute_type().as_str()),
            )),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ATTRIBUTE VALUES
// ============================================================================

/// A single scalar attribute value
///
/// Untagged so records read as flat JSON: `"name": "Paris"`, `"max_guest": 4`.
/// Variant order matters for deserialization: integers are tried before floats.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::Text(_) => AttributeType::Text,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::Float(_) => AttributeType::Float,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert a raw JSON value from a persisted record
    pub fn from_json(attribute: &str, value: &serde_json::Value) -> StoreResult<Self> {
        // u64 beyond i64::MAX would otherwise decode as a lossy float
        if value.is_u64() && !value.is_i64() {
            return Err(StoreError::MalformedRecord(format!(
                "attribute {} is out of integer range: {}",
                attribute, value
            )));
        }
        serde_json::from_value(value.clone()).map_err(|_| {
            StoreError::MalformedRecord(format!(
                "attribute {} is not a scalar value: {}",
                attribute, value
            ))
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Text(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Integer(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Value::from(*f),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

// ============================================================================
// FIELD DECLARATIONS
// ============================================================================

/// Declared field of an entity variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub type_: AttributeType,
}

/// Rust types that can back a declared field
pub trait Scalar: Sized {
    const TYPE: AttributeType;

    fn into_value(self) -> AttributeValue;

    /// Expects a value that already passed `TYPE.conform`
    fn from_value(value: AttributeValue) -> Option<Self>;
}

impl Scalar for String {
    const TYPE: AttributeType = AttributeType::Text;

    fn into_value(self) -> AttributeValue {
        AttributeValue::Text(self)
    }

    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Scalar for i64 {
    const TYPE: AttributeType = AttributeType::Integer;

    fn into_value(self) -> AttributeValue {
        AttributeValue::Integer(self)
    }

    fn from_value(value: AttributeValue) -> Option<Self> {
        value.as_i64()
    }
}

impl Scalar for f64 {
    const TYPE: AttributeType = AttributeType::Float;

    fn into_value(self) -> AttributeValue {
        AttributeValue::Float(self)
    }

    fn from_value(value: AttributeValue) -> Option<Self> {
        value.as_f64()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        let v = AttributeType::Integer.coerce("max_guest", "4").unwrap();
        assert_eq!(v, AttributeValue::Integer(4));

        let v = AttributeType::Integer.coerce("max_guest", " -2 ").unwrap();
        assert_eq!(v, AttributeValue::Integer(-2));
    }

    #[test]
    fn test_coerce_rejects_instead_of_falling_back() {
        let err = AttributeType::Integer.coerce("max_guest", "four").unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { ref attribute, .. } if attribute == "max_guest"));

        let err = AttributeType::Float.coerce("latitude", "north").unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { .. }));

        // 3.5 is not an integer
        assert!(AttributeType::Integer.coerce("max_guest", "3.5").is_err());
    }

    #[test]
    fn test_coerce_float_rejects_non_finite() {
        assert!(AttributeType::Float.coerce("latitude", "NaN").is_err());
        assert!(AttributeType::Float.coerce("latitude", "inf").is_err());
        assert_eq!(
            AttributeType::Float.coerce("latitude", "37.77").unwrap(),
            AttributeValue::Float(37.77)
        );
    }

    #[test]
    fn test_coerce_text_is_verbatim() {
        let v = AttributeType::Text.coerce("name", "  Golden Gate ").unwrap();
        assert_eq!(v, AttributeValue::Text("  Golden Gate ".to_string()));
    }

    #[test]
    fn test_conform_widens_integer_to_float() {
        let v = AttributeType::Float
            .conform("price", AttributeValue::Integer(3))
            .unwrap();
        assert_eq!(v, AttributeValue::Float(3.0));

        // but never narrows
        assert!(AttributeType::Integer
            .conform("rooms", AttributeValue::Float(3.0))
            .is_err());
        assert!(AttributeType::Text
            .conform("name", AttributeValue::Integer(1))
            .is_err());
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(
            AttributeValue::from_json("a", &json!(7)).unwrap(),
            AttributeValue::Integer(7)
        );
        assert_eq!(
            AttributeValue::from_json("a", &json!(7.5)).unwrap(),
            AttributeValue::Float(7.5)
        );
        assert_eq!(
            AttributeValue::from_json("a", &json!("x")).unwrap(),
            AttributeValue::Text("x".to_string())
        );
    }

    #[test]
    fn test_from_json_rejects_non_scalars() {
        for bad in [json!(null), json!(true), json!([1, 2]), json!({"a": 1})] {
            let err = AttributeValue::from_json("a", &bad).unwrap_err();
            assert!(matches!(err, StoreError::MalformedRecord(_)));
        }
    }

    #[test]
    fn test_from_json_rejects_integers_beyond_i64() {
        let err = AttributeValue::from_json("big", &json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord(_)));

        assert_eq!(
            AttributeValue::from_json("big", &json!(i64::MAX)).unwrap(),
            AttributeValue::Integer(i64::MAX)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(AttributeValue::from("Paris").to_string(), "Paris");
        assert_eq!(AttributeValue::from(12i64).to_string(), "12");
        assert_eq!(AttributeValue::from(0.5).to_string(), "0.5");
    }
}
