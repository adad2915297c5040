//! Error types for recordkv
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for recordkv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for recordkv
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A field value could not be encoded or decoded
    #[error("Codec error on field `{field}`: {reason}")]
    Codec {
        /// Field name
        field: String,
        /// What went wrong
        reason: String,
    },

    /// Schema definition rejected at construction
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Field name is neither declared in the schema nor `id`
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A typed record could not be rebuilt because a field is absent
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Store command applied to a key holding another kind of value
    #[error("Wrong type for key {key}: expected {expected}")]
    WrongType {
        /// Offending key
        key: String,
        /// Kind the command operates on
        expected: &'static str,
    },

    /// Store command argument rejected (bad bound, non-integer counter, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reply shape did not match the command that produced it
    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply {
        /// Command name
        command: &'static str,
        /// Debug rendering of the reply
        reply: String,
    },

    /// Insert attempted before the collection counter exists
    #[error("ID counter missing: {0}")]
    CounterMissing(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Opaque failure reported by a store implementation
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// Create a codec error for a field
    pub fn codec(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Codec {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unexpected-reply error
    pub fn unexpected_reply(command: &'static str, reply: impl std::fmt::Debug) -> Self {
        Error::UnexpectedReply {
            command,
            reply: format!("{:?}", reply),
        }
    }
}
