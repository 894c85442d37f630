//! Field value types for stored documents.
//!
//! This module defines the [`FieldValue`] enum which represents the scalar
//! values a document can store, and [`StoredValue`], the shape a field takes
//! once it is projected into a similarity response.
//!
//! # Supported Types
//!
//! - **Text** - String data, analyzed for lexical similarity
//! - **Integer** - 64-bit signed integers
//! - **Float** - 64-bit floating-point numbers
//! - **Boolean** - true/false values
//!
//! # Serialization
//!
//! Values serialize untagged, as the bare JSON value:
//!
//! ```
//! use relata::document::field_value::{FieldValue, StoredValue};
//!
//! let value = StoredValue::from_values(vec![FieldValue::Text("news".to_string())]);
//! assert_eq!(serde_json::to_string(&value.unwrap()).unwrap(), "\"news\"");
//!
//! let multi = StoredValue::from_values(vec![FieldValue::Integer(1), FieldValue::Integer(2)]);
//! assert_eq!(serde_json::to_string(&multi.unwrap()).unwrap(), "[1,2]");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RelataError, Result};

/// Represents a single stored value of a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
}

impl FieldValue {
    /// Convert to text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value.
    ///
    /// Text values are parsed, so a stored `"2024"` compares numerically
    /// against a filter bound of `2020`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Boolean(_) => None,
        }
    }

    /// Convert to boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Text(s) => match s.to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Convert a scalar JSON value into a field value.
    ///
    /// Arrays, objects and `null` are not scalars and are rejected; callers
    /// handle multi-valued fields by converting each element.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(RelataError::invalid_argument(format!(
                        "Unsupported number: {n}"
                    )))
                }
            }
            serde_json::Value::String(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(RelataError::invalid_argument(format!(
                "Expected a scalar value, got {other}"
            ))),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

/// A field as it appears in a projected record.
///
/// Single-valued fields are scalars and multi-valued fields are ordered
/// lists. There is no empty variant: an absent field is omitted instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Exactly one stored value.
    Single(FieldValue),
    /// Two or more stored values, in stored order.
    Multi(Vec<FieldValue>),
}

impl StoredValue {
    /// Build the projected shape of a field from its stored values.
    ///
    /// Returns `None` when there are no values.
    pub fn from_values(mut values: Vec<FieldValue>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(StoredValue::Single),
            _ => Some(StoredValue::Multi(values)),
        }
    }

    /// Iterate over the underlying scalar values.
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        let slice: &[FieldValue] = match self {
            StoredValue::Single(value) => std::slice::from_ref(value),
            StoredValue::Multi(values) => values,
        };
        slice.iter()
    }
}
