//! Core types and traits for recordkv
//!
//! This crate defines the foundational types used throughout the system:
//! - RecordId / Identified: Record identifiers and ID-tagged results
//! - FieldType / Value: The closed set of field kinds and typed values
//! - Schema: Ordered, validated field declarations for one collection
//! - Record / Fields: Mapping between domain types and field maps
//! - KeySpace: Store key layout of a collection
//! - Command / Reply: The primitive store command surface
//! - Store / Batch: The backing store seam and its atomic batch handle
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod command;
pub mod error;
pub mod key;
pub mod record;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use command::{Command, LexBound, Limit, Reply, ScoreBound};
pub use error::{Error, Result};
pub use key::KeySpace;
pub use record::{Fields, Record};
pub use schema::{FieldDef, Schema, ID_FIELD};
pub use traits::{Batch, Store};
pub use types::{Identified, RecordId};
pub use value::{FieldType, Value};
