//! Record engine for recordkv
//!
//! This crate maps typed records onto a key-value store:
//! - Repository: insert, find, update and delete for one collection
//! - RecordDb: shared store handle that opens repositories
//! - Codec: field values to stored strings and back
//! - Index: `value:id` tokens in per-field sorted sets
//! - Query: predicates translated to lexicographic range scans
//! - Config: codec policy, index encoding and ID allocation switches
//!
//! The engine is the only component that knows about:
//! - The record/index/counter key layout
//! - Batching a mutation so the record and its index commit together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod db;
pub mod index;
pub mod index_key;
pub mod query;
pub mod repository;
pub mod update;

pub use codec::{FieldError, NormalizedRecord};
pub use config::{CodecPolicy, IdAllocation, IndexEncoding, RepositoryConfig};
pub use db::RecordDb;
pub use index::IndexManager;
pub use query::{Condition, Operator, Predicate, QueryTranslator, RangeScan};
pub use repository::Repository;
pub use update::{Patch, Update, UpdateOptions};
