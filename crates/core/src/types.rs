//! Core types for recordkv
//!
//! This module defines the foundational types:
//! - RecordId: Numeric identifier allocated from a collection counter
//! - Identified: A record paired with its RecordId

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a stored record
///
/// RecordIds are allocated from the collection's ID counter, start at 1,
/// increase strictly and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw counter value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A record together with the ID it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Identified<T> {
    /// Record identifier
    pub id: RecordId,
    /// The record itself
    pub record: T,
}

impl<T> Identified<T> {
    /// Pair a record with its ID
    pub fn new(id: RecordId, record: T) -> Self {
        Self { id, record }
    }

    /// Map the record, keeping the ID
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Identified<U> {
        Identified {
            id: self.id,
            record: f(self.record),
        }
    }

    /// Discard the ID
    pub fn into_record(self) -> T {
        self.record
    }
}
