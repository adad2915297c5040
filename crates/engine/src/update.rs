//! Update documents

use recordkv_core::{Error, Fields, Result, Schema, Value, ID_FIELD};
use std::collections::BTreeSet;

/// Options for `update` and `delete`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Apply to every match instead of the first one only
    pub multi: bool,
}

impl UpdateOptions {
    /// Apply to the first match only
    pub fn single() -> Self {
        Self { multi: false }
    }

    /// Apply to every match
    pub fn multi() -> Self {
        Self { multi: true }
    }
}

/// How `update` rewrites each matched record
#[derive(Debug, Clone, PartialEq)]
pub enum Update<R> {
    /// Replace the record with a new one, keeping its ID
    Replace(R),
    /// Change individual fields
    Patch(Patch),
}

impl<R> From<Patch> for Update<R> {
    fn from(patch: Patch) -> Self {
        Update::Patch(patch)
    }
}

/// `$set` / `$unset` field changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    set: Fields,
    unset: BTreeSet<String>,
}

impl Patch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// `$set` a field
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field, value);
        self
    }

    /// `$unset` a field
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.insert(field.into());
        self
    }

    /// Fields to set
    pub fn set_fields(&self) -> &Fields {
        &self.set
    }

    /// Fields to remove
    pub fn unset_fields(&self) -> &BTreeSet<String> {
        &self.unset
    }

    /// True if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Reject patches touching `id`, unknown fields, or one field both set
    /// and unset
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for name in self.set.names().chain(self.unset.iter().map(String::as_str)) {
            if name == ID_FIELD {
                return Err(Error::InvalidOperation(
                    "the id field cannot be modified".into(),
                ));
            }
            schema.require(name)?;
        }
        if let Some(both) = self.unset.iter().find(|name| self.set.contains(name)) {
            return Err(Error::InvalidOperation(format!(
                "field `{}` is both set and unset",
                both
            )));
        }
        Ok(())
    }
}
