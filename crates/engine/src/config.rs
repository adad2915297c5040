//! Repository configuration
//!
//! Three independent switches control how a repository treats bad field
//! values, how it lays out index tokens, and how it allocates IDs. All of
//! them can be set in code with the `with_*` builders or loaded from TOML.
//!
//! # Example
//!
//! ```toml
//! codec_policy = "best_effort"
//! index_encoding = "ordered"
//! id_allocation = "atomic"
//! ```

use recordkv_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Switches
// ============================================================================

/// What to do with a field that fails to encode or decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecPolicy {
    /// Log the failure and omit the field
    #[default]
    BestEffort,
    /// Fail the whole operation with `Error::Codec`
    Strict,
}

/// Layout of the value part of index tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexEncoding {
    /// Literal normalized string; NUMBER and DATE ranges compare digit by
    /// digit, so `"10" < "5"`
    Lexical,
    /// Fixed-width order-preserving hex for NUMBER and DATE; STRING unchanged
    #[default]
    Ordered,
}

/// How insert obtains a fresh ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdAllocation {
    /// `INCR` the counter before the write batch and use the previous value
    #[default]
    Atomic,
    /// `GET` the counter, then `INCR` it inside the write batch; concurrent
    /// inserts can observe the same value
    ReadThenIncrement,
}

// ============================================================================
// RepositoryConfig
// ============================================================================

/// Configuration shared by the repositories of a `RecordDb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Field codec failure handling
    #[serde(default)]
    pub codec_policy: CodecPolicy,
    /// Index token layout
    #[serde(default)]
    pub index_encoding: IndexEncoding,
    /// ID allocation strategy
    #[serde(default)]
    pub id_allocation: IdAllocation,
}

impl RepositoryConfig {
    /// Create a RepositoryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings that read and write the legacy key layout: literal index
    /// values and read-then-increment IDs
    pub fn legacy() -> Self {
        Self {
            codec_policy: CodecPolicy::BestEffort,
            index_encoding: IndexEncoding::Lexical,
            id_allocation: IdAllocation::ReadThenIncrement,
        }
    }

    /// Set the codec policy
    pub fn with_codec_policy(mut self, codec_policy: CodecPolicy) -> Self {
        self.codec_policy = codec_policy;
        self
    }

    /// Set the index encoding
    pub fn with_index_encoding(mut self, index_encoding: IndexEncoding) -> Self {
        self.index_encoding = index_encoding;
        self
    }

    /// Set the ID allocation strategy
    pub fn with_id_allocation(mut self, id_allocation: IdAllocation) -> Self {
        self.id_allocation = id_allocation;
        self
    }

    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse config from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# recordkv repository configuration
#
# Field codec failures: "best_effort" (default) or "strict"
#   "best_effort" = log the failure and omit the field
#   "strict"      = fail the operation
codec_policy = "best_effort"

# Index token layout: "ordered" (default) or "lexical"
#   "ordered" = fixed-width order-preserving NUMBER/DATE tokens
#   "lexical" = literal decimal tokens (legacy layout)
index_encoding = "ordered"

# ID allocation: "atomic" (default) or "read_then_increment"
id_allocation = "atomic"
"#
    }
}
