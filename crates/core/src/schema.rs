//! Collection schema
//!
//! A schema is an ordered list of `(name, FieldType)` pairs. It fixes which
//! fields a collection encodes and indexes, and it is immutable once a
//! repository holds it.
//!
//! The name `id` is reserved: every record carries an implicit numeric `id`
//! that is stored and indexed alongside the declared fields.

use crate::error::{Error, Result};
use crate::value::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reserved name of the implicit record identifier field
pub const ID_FIELD: &str = "id";

/// One declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field kind
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDef {
    /// Declare a field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered, validated field list for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDef>", into = "Vec<FieldDef>")]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Build a schema, rejecting empty, duplicate or reserved names
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(Error::InvalidSchema("field name must not be empty".into()));
            }
            if field.name == ID_FIELD {
                return Err(Error::InvalidSchema(format!(
                    "`{}` is reserved for the record identifier",
                    ID_FIELD
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field `{}`",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Build a schema from `(name, type)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, FieldType)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, field_type)| FieldDef::new(name, field_type))
                .collect(),
        )
    }

    /// Declared fields in order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Kind of a field, `id` included
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        if name == ID_FIELD {
            return Some(FieldType::Number);
        }
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field_type)
    }

    /// Kind of a field, or `UnknownField`
    pub fn require(&self, name: &str) -> Result<FieldType> {
        self.field_type(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Whether the field is declared (`id` is not)
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldDef>> for Schema {
    type Error = Error;

    fn try_from(fields: Vec<FieldDef>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<Schema> for Vec<FieldDef> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}
