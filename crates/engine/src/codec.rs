//! Field codec
//!
//! Converts typed field values to the strings stored in record hashes and
//! back:
//!
//! | Type | Encoded as | Decoded by |
//! |------|------------|------------|
//! | NUMBER | decimal string, `-0` as `0` | `f64` parse |
//! | DATE | whole seconds since the epoch, truncated toward zero | timestamp from seconds |
//! | STRING | unchanged | unchanged |
//!
//! Record-level encoding only writes fields that are present and truthy: an
//! empty string or the number `0` is skipped without error.
//!
//! Failures are reported per field. [`encode_record`] and [`decode_record`]
//! never abort on a bad field; they return what succeeded alongside the
//! list of [`FieldError`]s, and the caller applies its `CodecPolicy`.

use chrono::{DateTime, Utc};
use recordkv_core::{Error, FieldType, Fields, RecordId, Schema, Value, ID_FIELD};
use std::collections::BTreeMap;

/// Wire form of a record: field name → stored string
pub type NormalizedRecord = BTreeMap<String, String>;

/// Encode or decode failure for one field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}`: {reason}")]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// What went wrong
    pub reason: String,
}

impl FieldError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<FieldError> for Error {
    fn from(e: FieldError) -> Self {
        Error::Codec {
            field: e.field,
            reason: e.reason,
        }
    }
}

// ============================================================================
// Single values
// ============================================================================

/// Encode one value as the declared field type
pub fn encode_value(field: &str, field_type: FieldType, value: &Value) -> Result<String, FieldError> {
    match (field_type, value) {
        (FieldType::Number, Value::Number(n)) => {
            if !n.is_finite() {
                return Err(FieldError::new(field, format!("{} is not a finite number", n)));
            }
            Ok(format_number(*n))
        }
        (FieldType::Date, Value::Date(d)) => Ok(unix_seconds(d).to_string()),
        (FieldType::String, Value::String(s)) => Ok(s.clone()),
        (expected, other) => Err(FieldError::new(
            field,
            format!("expected {}, got {}", expected, other.field_type()),
        )),
    }
}

/// Decode one stored string as the declared field type
pub fn decode_value(field: &str, field_type: FieldType, raw: &str) -> Result<Value, FieldError> {
    match field_type {
        FieldType::Number => {
            let n: f64 = raw
                .parse()
                .map_err(|_| FieldError::new(field, format!("`{}` is not a number", raw)))?;
            if !n.is_finite() {
                return Err(FieldError::new(field, format!("`{}` is not a finite number", raw)));
            }
            Ok(Value::Number(n))
        }
        FieldType::Date => {
            let secs: i64 = raw
                .parse()
                .map_err(|_| FieldError::new(field, format!("`{}` is not a unix timestamp", raw)))?;
            DateTime::from_timestamp(secs, 0)
                .map(Value::Date)
                .ok_or_else(|| FieldError::new(field, format!("timestamp {} out of range", secs)))
        }
        FieldType::String => Ok(Value::String(raw.to_string())),
    }
}

/// Decimal rendering; integral values carry no fractional part
fn format_number(n: f64) -> String {
    if n == 0.0 {
        // folds -0
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Seconds since the epoch, truncated toward zero
pub fn unix_seconds(d: &DateTime<Utc>) -> i64 {
    let secs = d.timestamp();
    if secs < 0 && d.timestamp_subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

// ============================================================================
// Whole records
// ============================================================================

/// Result of encoding a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRecord {
    /// Successfully encoded fields, schema fields only
    pub normalized: NormalizedRecord,
    /// Fields that failed to encode
    pub failures: Vec<FieldError>,
}

/// Result of decoding a stored hash
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRecord {
    /// Stored `id`, if present and valid
    pub id: Option<RecordId>,
    /// Successfully decoded schema fields
    pub fields: Fields,
    /// Fields that failed to decode
    pub failures: Vec<FieldError>,
}

/// Encode the truthy schema fields of `fields`, in schema order
///
/// Fields outside the schema are ignored.
pub fn encode_record(schema: &Schema, fields: &Fields) -> EncodedRecord {
    let mut encoded = EncodedRecord::default();
    for def in schema.fields() {
        let Some(value) = fields.get(&def.name) else {
            continue;
        };
        if !value.is_truthy() {
            continue;
        }
        match encode_value(&def.name, def.field_type, value) {
            Ok(s) => {
                encoded.normalized.insert(def.name.clone(), s);
            }
            Err(e) => encoded.failures.push(e),
        }
    }
    encoded
}

/// Decode the schema fields present in a stored hash
pub fn decode_record(schema: &Schema, raw: &BTreeMap<String, String>) -> DecodedRecord {
    let mut decoded = DecodedRecord::default();
    for def in schema.fields() {
        let Some(stored) = raw.get(&def.name) else {
            continue;
        };
        match decode_value(&def.name, def.field_type, stored) {
            Ok(value) => {
                decoded.fields.insert(def.name.clone(), value);
            }
            Err(e) => decoded.failures.push(e),
        }
    }
    if let Some(stored) = raw.get(ID_FIELD) {
        match stored.parse::<RecordId>() {
            Ok(id) => decoded.id = Some(id),
            Err(_) => decoded
                .failures
                .push(FieldError::new(ID_FIELD, format!("`{}` is not a record id", stored))),
        }
    }
    decoded
}
