//! Store key layout for a collection
//!
//! Every collection is namespaced by its alias:
//!
//! | Key | Kind | Holds |
//! |-----|------|-------|
//! | `{alias}:{id}` | hash | the normalized record |
//! | `{alias}.{field}.index` | sorted set | `value:id` index tokens |
//! | `{alias}__idincr` | string | next ID to allocate |

use crate::error::{Error, Result};
use crate::types::RecordId;

/// Suffix of the ID counter key
pub const COUNTER_SUFFIX: &str = "__idincr";

/// Suffix of per-field index keys
pub const INDEX_SUFFIX: &str = ".index";

/// Key builder for one collection alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySpace {
    alias: String,
}

impl KeySpace {
    /// Create a key space; the alias must be non-empty
    pub fn new(alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(Error::InvalidOperation(
                "collection alias must not be empty".into(),
            ));
        }
        Ok(Self { alias })
    }

    /// Collection alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Hash key of a record
    pub fn record_key(&self, id: RecordId) -> String {
        format!("{}:{}", self.alias, id)
    }

    /// Sorted-set key of a field index
    pub fn index_key(&self, field: &str) -> String {
        format!("{}.{}{}", self.alias, field, INDEX_SUFFIX)
    }

    /// Scalar key of the ID counter
    pub fn counter_key(&self) -> String {
        format!("{}{}", self.alias, COUNTER_SUFFIX)
    }
}
