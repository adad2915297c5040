//! Stored entry: the value held under one key
//!
//! A key holds exactly one kind of value. Commands for another kind fail
//! with `WrongType` instead of coercing.

use crate::sorted_set::SortedSet;
use recordkv_core::{Error, Result};
use std::collections::BTreeMap;

/// Value held under one key
#[derive(Debug, Clone)]
pub enum Entry {
    /// Scalar string (also holds integer counters)
    Str(String),
    /// Field → value map
    Hash(BTreeMap<String, String>),
    /// Scored members
    ZSet(SortedSet),
}

impl Entry {
    /// Kind name used in `WrongType` errors
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Str(_) => "string",
            Entry::Hash(_) => "hash",
            Entry::ZSet(_) => "zset",
        }
    }

    /// Containers with no elements are removed from the keyspace
    pub fn is_empty(&self) -> bool {
        match self {
            Entry::Str(_) => false,
            Entry::Hash(h) => h.is_empty(),
            Entry::ZSet(z) => z.is_empty(),
        }
    }

    /// Borrow as a string
    pub fn as_str(&self, key: &str) -> Result<&str> {
        match self {
            Entry::Str(s) => Ok(s),
            _ => Err(wrong_type(key, "string")),
        }
    }

    /// Borrow as a hash
    pub fn as_hash(&self, key: &str) -> Result<&BTreeMap<String, String>> {
        match self {
            Entry::Hash(h) => Ok(h),
            _ => Err(wrong_type(key, "hash")),
        }
    }

    /// Borrow as a hash, mutably
    pub fn as_hash_mut(&mut self, key: &str) -> Result<&mut BTreeMap<String, String>> {
        match self {
            Entry::Hash(h) => Ok(h),
            _ => Err(wrong_type(key, "hash")),
        }
    }

    /// Borrow as a sorted set
    pub fn as_zset(&self, key: &str) -> Result<&SortedSet> {
        match self {
            Entry::ZSet(z) => Ok(z),
            _ => Err(wrong_type(key, "zset")),
        }
    }

    /// Borrow as a sorted set, mutably
    pub fn as_zset_mut(&mut self, key: &str) -> Result<&mut SortedSet> {
        match self {
            Entry::ZSet(z) => Ok(z),
            _ => Err(wrong_type(key, "zset")),
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> Error {
    Error::WrongType {
        key: key.to_string(),
        expected,
    }
}
