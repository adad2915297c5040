//! Record mapping
//!
//! Repositories are generic over a [`Record`]: a caller-declared type that
//! converts to and from a [`Fields`] map of typed values. `Fields` itself
//! implements `Record`, so a repository can also be used without a
//! dedicated struct.
//!
//! ```ignore
//! struct User { name: String, age: f64 }
//!
//! impl Record for User {
//!     fn to_fields(&self) -> Fields {
//!         Fields::new().with("name", self.name.as_str()).with("age", self.age)
//!     }
//!
//!     fn from_fields(mut fields: Fields) -> Result<Self> {
//!         Ok(User { name: fields.take_string("name")?, age: fields.take_number("age")? })
//!     }
//! }
//! ```

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Conversion between a domain type and its field map
pub trait Record: Sized + Send + Sync {
    /// Field map to be encoded; fields outside the schema are ignored
    fn to_fields(&self) -> Fields;

    /// Rebuild from decoded fields (the `id` is not included)
    fn from_fields(fields: Fields) -> Result<Self>;
}

/// Map of field name to typed value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<String, Value>,
}

impl Fields {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Get a value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Remove a value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Whether the field is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in name order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take a required NUMBER field
    pub fn take_number(&mut self, name: &str) -> Result<f64> {
        match self.values.remove(name) {
            Some(Value::Number(n)) => Ok(n),
            Some(other) => Err(Error::codec(name, format!("expected NUMBER, got {}", other.field_type()))),
            None => Err(Error::MissingField(name.to_string())),
        }
    }

    /// Take a required STRING field
    pub fn take_string(&mut self, name: &str) -> Result<String> {
        match self.values.remove(name) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::codec(name, format!("expected STRING, got {}", other.field_type()))),
            None => Err(Error::MissingField(name.to_string())),
        }
    }

    /// Take a required DATE field
    pub fn take_date(&mut self, name: &str) -> Result<DateTime<Utc>> {
        match self.values.remove(name) {
            Some(Value::Date(d)) => Ok(d),
            Some(other) => Err(Error::codec(name, format!("expected DATE, got {}", other.field_type()))),
            None => Err(Error::MissingField(name.to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl Record for Fields {
    fn to_fields(&self) -> Fields {
        self.clone()
    }

    fn from_fields(fields: Fields) -> Result<Self> {
        Ok(fields)
    }
}
