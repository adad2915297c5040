//! Store command surface
//!
//! Every primitive the record engine needs from its backing store is a
//! [`Command`]. A store executes a list of commands as one atomic unit and
//! answers with one [`Reply`] per command, in submission order.
//!
//! Range bounds use the conventional textual syntax so they can be parsed
//! from and rendered to strings:
//!
//! - lexicographic: `-`, `+`, `[member` (inclusive), `(member` (exclusive)
//! - score: `-inf`, `+inf`, `1.5` (inclusive), `(1.5` (exclusive)

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Bounds
// ============================================================================

/// Bound of a lexicographic range over sorted-set members
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound {
    /// Below every member (`-`)
    NegInf,
    /// Above every member (`+`)
    PosInf,
    /// Inclusive bound (`[member`)
    Inclusive(String),
    /// Exclusive bound (`(member`)
    Exclusive(String),
}

impl LexBound {
    /// Whether `member` lies on the allowed side of this bound used as a minimum
    pub fn admits_as_min(&self, member: &str) -> bool {
        match self {
            LexBound::NegInf => true,
            LexBound::PosInf => false,
            LexBound::Inclusive(b) => member >= b.as_str(),
            LexBound::Exclusive(b) => member > b.as_str(),
        }
    }

    /// Whether `member` lies on the allowed side of this bound used as a maximum
    pub fn admits_as_max(&self, member: &str) -> bool {
        match self {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(b) => member <= b.as_str(),
            LexBound::Exclusive(b) => member < b.as_str(),
        }
    }
}

impl fmt::Display for LexBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexBound::NegInf => f.write_str("-"),
            LexBound::PosInf => f.write_str("+"),
            LexBound::Inclusive(m) => write!(f, "[{}", m),
            LexBound::Exclusive(m) => write!(f, "({}", m),
        }
    }
}

impl FromStr for LexBound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "-" => Ok(LexBound::NegInf),
            "+" => Ok(LexBound::PosInf),
            _ => {
                if let Some(rest) = s.strip_prefix('[') {
                    Ok(LexBound::Inclusive(rest.to_string()))
                } else if let Some(rest) = s.strip_prefix('(') {
                    Ok(LexBound::Exclusive(rest.to_string()))
                } else {
                    Err(Error::InvalidArgument(format!(
                        "min or max not valid string range item: {}",
                        s
                    )))
                }
            }
        }
    }
}

/// Bound of a score range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// `-inf`
    NegInf,
    /// `+inf`
    PosInf,
    /// Inclusive score
    Inclusive(f64),
    /// Exclusive score (`(score`)
    Exclusive(f64),
}

impl ScoreBound {
    /// Whether `score` satisfies this bound used as a minimum
    pub fn admits_as_min(&self, score: f64) -> bool {
        match self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Inclusive(b) => score >= *b,
            ScoreBound::Exclusive(b) => score > *b,
        }
    }

    /// Whether `score` satisfies this bound used as a maximum
    pub fn admits_as_max(&self, score: f64) -> bool {
        match self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Inclusive(b) => score <= *b,
            ScoreBound::Exclusive(b) => score < *b,
        }
    }
}

impl fmt::Display for ScoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBound::NegInf => f.write_str("-inf"),
            ScoreBound::PosInf => f.write_str("+inf"),
            ScoreBound::Inclusive(s) => write!(f, "{}", s),
            ScoreBound::Exclusive(s) => write!(f, "({}", s),
        }
    }
}

impl FromStr for ScoreBound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("min or max is not a float: {}", s));
        match s {
            "-inf" => Ok(ScoreBound::NegInf),
            "+inf" | "inf" => Ok(ScoreBound::PosInf),
            _ => {
                let (exclusive, number) = match s.strip_prefix('(') {
                    Some(rest) => (true, rest),
                    None => (false, s),
                };
                let score: f64 = number.parse().map_err(|_| invalid())?;
                if score.is_nan() {
                    return Err(invalid());
                }
                Ok(if exclusive {
                    ScoreBound::Exclusive(score)
                } else {
                    ScoreBound::Inclusive(score)
                })
            }
        }
    }
}

/// `LIMIT offset count` clause of a range command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Members to skip
    pub offset: usize,
    /// Maximum members to return
    pub count: usize,
}

impl Limit {
    /// Create a limit clause
    pub fn new(offset: usize, count: usize) -> Self {
        Self { offset, count }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// One primitive store command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Read a scalar
    Get { key: String },
    /// Write a scalar, replacing whatever the key held
    Set { key: String, value: String },
    /// Increment an integer scalar, creating it at 0 first if absent
    Incr { key: String },
    /// Count how many of the keys exist
    Exists { keys: Vec<String> },
    /// Remove keys of any kind
    Del { keys: Vec<String> },
    /// Write hash fields
    HSet { key: String, fields: Vec<(String, String)> },
    /// Read one hash field
    HGet { key: String, field: String },
    /// Read a whole hash
    HGetAll { key: String },
    /// Read several hash fields
    HMGet { key: String, fields: Vec<String> },
    /// Remove hash fields
    HDel { key: String, fields: Vec<String> },
    /// Add or rescore a sorted-set member
    ZAdd { key: String, score: f64, member: String },
    /// Remove sorted-set members
    ZRem { key: String, members: Vec<String> },
    /// Members with score in range, ordered by score then member
    ZRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
        with_scores: bool,
        limit: Option<Limit>,
    },
    /// Members in lexicographic range
    ZRangeByLex {
        key: String,
        min: LexBound,
        max: LexBound,
        limit: Option<Limit>,
    },
}

impl Command {
    /// Command name as used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Incr { .. } => "INCR",
            Command::Exists { .. } => "EXISTS",
            Command::Del { .. } => "DEL",
            Command::HSet { .. } => "HSET",
            Command::HGet { .. } => "HGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HMGet { .. } => "HMGET",
            Command::HDel { .. } => "HDEL",
            Command::ZAdd { .. } => "ZADD",
            Command::ZRem { .. } => "ZREM",
            Command::ZRangeByScore { .. } => "ZRANGEBYSCORE",
            Command::ZRangeByLex { .. } => "ZRANGEBYLEX",
        }
    }

    /// Whether the command leaves the store unchanged
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::Get { .. }
                | Command::Exists { .. }
                | Command::HGet { .. }
                | Command::HGetAll { .. }
                | Command::HMGet { .. }
                | Command::ZRangeByScore { .. }
                | Command::ZRangeByLex { .. }
        )
    }

    /// Keys the command touches
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Command::Exists { keys } | Command::Del { keys } => {
                keys.iter().map(String::as_str).collect()
            }
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::Incr { key }
            | Command::HSet { key, .. }
            | Command::HGet { key, .. }
            | Command::HGetAll { key }
            | Command::HMGet { key, .. }
            | Command::HDel { key, .. }
            | Command::ZAdd { key, .. }
            | Command::ZRem { key, .. }
            | Command::ZRangeByScore { key, .. }
            | Command::ZRangeByLex { key, .. } => vec![key.as_str()],
        }
    }
}

// ============================================================================
// Replies
// ============================================================================

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Absent value
    Nil,
    /// Plain acknowledgement
    Ok,
    /// Integer result (counts, counters)
    Integer(i64),
    /// Single string value
    Bulk(String),
    /// List of strings (range results)
    Array(Vec<String>),
    /// List of optional strings (HMGET)
    OptionalArray(Vec<Option<String>>),
    /// Whole hash (HGETALL); empty when the key is absent
    Hash(BTreeMap<String, String>),
}

impl Reply {
    /// Expect `Ok`
    pub fn into_ok(self, command: &'static str) -> Result<()> {
        match self {
            Reply::Ok => Ok(()),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }

    /// Expect `Integer`
    pub fn into_integer(self, command: &'static str) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }

    /// Expect `Bulk` or `Nil`
    pub fn into_optional_string(self, command: &'static str) -> Result<Option<String>> {
        match self {
            Reply::Bulk(s) => Ok(Some(s)),
            Reply::Nil => Ok(None),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }

    /// Expect `Array`
    pub fn into_array(self, command: &'static str) -> Result<Vec<String>> {
        match self {
            Reply::Array(items) => Ok(items),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }

    /// Expect `OptionalArray`
    pub fn into_optional_array(self, command: &'static str) -> Result<Vec<Option<String>>> {
        match self {
            Reply::OptionalArray(items) => Ok(items),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }

    /// Expect `Hash`
    pub fn into_hash(self, command: &'static str) -> Result<BTreeMap<String, String>> {
        match self {
            Reply::Hash(map) => Ok(map),
            other => Err(Error::unexpected_reply(command, other)),
        }
    }
}
