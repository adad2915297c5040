//! Value types for recordkv
//!
//! This module defines:
//! - FieldType: The closed set of field kinds a schema may declare
//! - Value: A typed field value carried by records and predicates
//!
//! ## Type Rules
//!
//! - Three kinds only: NUMBER, STRING, DATE
//! - No implicit coercions: a `String("5")` is never a NUMBER
//! - Number equality follows IEEE-754: `NaN != NaN`, `-0.0 == 0.0`
//! - Dates are stored at second precision; sub-second parts do not survive
//!   a round trip through the store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    /// 64-bit floating point number
    Number,
    /// UTF-8 string
    String,
    /// UTC timestamp, second precision in storage
    Date,
}

impl FieldType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "NUMBER",
            FieldType::String => "STRING",
            FieldType::Date => "DATE",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// String value
    String(String),
    /// Timestamp value
    Date(DateTime<Utc>),
}

impl Value {
    /// Field kind this value belongs to
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Date(_) => FieldType::Date,
        }
    }

    /// Truthiness used when deciding whether a field is written at all
    ///
    /// Empty strings, `0` and `NaN` are falsy. Dates are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) => true,
        }
    }

    /// Get as f64 if this is a Number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as timestamp if this is a Date value
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
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

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}
