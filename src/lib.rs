//! recordkv - Typed records with secondary indexes over a key-value store
//!
//! recordkv stores records of a declared schema as hashes and keeps one
//! sorted-set index per field, so records can be found by equality and
//! range predicates without scanning.
//!
//! # Quick Start
//!
//! ```ignore
//! use recordkv::{FieldType, Fields, MemoryStore, Predicate, RecordDb, Schema};
//!
//! let db = RecordDb::new(MemoryStore::new());
//! let schema = Schema::from_pairs([("name", FieldType::String), ("age", FieldType::Number)])?;
//! let users = db.create_repository("users", schema).await?;
//!
//! users.insert(Fields::new().with("name", "Mark").with("age", 30)).await?;
//! let adults = users.find(&Predicate::new().gte("age", 18)).await?;
//! ```
//!
//! # Architecture
//!
//! The engine talks to storage only through the [`Store`] trait. The
//! bundled [`MemoryStore`] implements it in process; any backend that can
//! run a batch of commands atomically can stand in for it.

pub use recordkv_core::{
    Batch, Command, Error, FieldDef, FieldType, Fields, Identified, KeySpace, LexBound, Limit,
    Record, RecordId, Reply, Result, Schema, ScoreBound, Store, Value, ID_FIELD,
};
pub use recordkv_engine::*;
pub use recordkv_storage::MemoryStore;
