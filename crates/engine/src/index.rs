//! Secondary index maintenance
//!
//! Index writes are never executed here. [`IndexManager`] queues `ZADD` and
//! `ZREM` commands on the caller's [`Batch`] so they commit together with
//! the record hash they describe.

use crate::codec::NormalizedRecord;
use crate::config::IndexEncoding;
use crate::index_key::{index_value, token};
use recordkv_core::{Batch, Error, FieldType, KeySpace, RecordId, Result, Schema, Store};
use std::sync::Arc;
use tracing::warn;

/// Queues index updates for one collection
#[derive(Debug, Clone)]
pub struct IndexManager {
    keys: KeySpace,
    schema: Arc<Schema>,
    encoding: IndexEncoding,
}

impl IndexManager {
    /// Create a manager for a collection
    pub fn new(keys: KeySpace, schema: Arc<Schema>, encoding: IndexEncoding) -> Self {
        Self {
            keys,
            schema,
            encoding,
        }
    }

    /// Index token for a normalized field value
    ///
    /// Fields absent from the schema are indexed as STRING.
    pub fn entry_token(&self, field: &str, normalized: &str, id: RecordId) -> Result<String> {
        let field_type = self.schema.field_type(field).unwrap_or(FieldType::String);
        let value = index_value(self.encoding, field_type, normalized)
            .map_err(|reason| Error::codec(field, reason))?;
        Ok(token(&value, id))
    }

    /// Queue `ZADD {alias}.{field}.index 0 {token}`
    pub fn add_entry<S: Store + ?Sized>(
        &self,
        batch: &mut Batch<'_, S>,
        field: &str,
        normalized: &str,
        id: RecordId,
    ) -> Result<()> {
        let member = self.entry_token(field, normalized, id)?;
        batch.zadd(self.keys.index_key(field), 0.0, member);
        Ok(())
    }

    /// Queue `ZREM {alias}.{field}.index {token}`
    ///
    /// A stored value that no longer maps to a token is logged and skipped;
    /// there is no member to remove.
    pub fn remove_entry<S: Store + ?Sized>(
        &self,
        batch: &mut Batch<'_, S>,
        field: &str,
        normalized: &str,
        id: RecordId,
    ) {
        match self.entry_token(field, normalized, id) {
            Ok(member) => {
                batch.zrem(self.keys.index_key(field), vec![member]);
            }
            Err(e) => {
                warn!(
                    target: "recordkv::index",
                    collection = %self.keys.alias(),
                    field = %field,
                    id = %id,
                    error = %e,
                    "Stale index entry cannot be addressed"
                );
            }
        }
    }

    /// Queue an entry for every field of a normalized record
    pub fn add_record<S: Store + ?Sized>(
        &self,
        batch: &mut Batch<'_, S>,
        record: &NormalizedRecord,
        id: RecordId,
    ) -> Result<()> {
        for (field, value) in record {
            self.add_entry(batch, field, value, id)?;
        }
        Ok(())
    }

    /// Queue removal of every field of a normalized record
    pub fn remove_record<S: Store + ?Sized>(
        &self,
        batch: &mut Batch<'_, S>,
        record: &NormalizedRecord,
        id: RecordId,
    ) {
        for (field, value) in record {
            self.remove_entry(batch, field, value, id);
        }
    }
}
