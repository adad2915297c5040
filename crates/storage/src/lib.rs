//! Storage layer for recordkv
//!
//! This crate implements the in-process store backend with:
//! - MemoryStore: HashMap keyspace behind a RwLock, atomic batches
//! - Entry: string, hash and sorted-set values, one kind per key
//! - SortedSet: (score, member) ordering with lexicographic and score ranges
//!
//! The record engine only depends on the `Store` trait from
//! `recordkv-core`; `MemoryStore` is one implementation of it, suited to
//! tests and embedders that do not need a networked store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod memory;
pub mod sorted_set;

pub use entry::Entry;
pub use memory::MemoryStore;
pub use sorted_set::SortedSet;
