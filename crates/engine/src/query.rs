//! Predicates and their translation to index range scans
//!
//! A [`Predicate`] is a conjunction of per-field clauses. Each clause is a
//! plain value (equality) or a set of comparison operators. Translation
//! produces one `ZRANGEBYLEX` scan per operator; the matching IDs are the
//! intersection of every scan's results.
//!
//! | Operator | Min | Max |
//! |----------|-----|-----|
//! | `$eq`  | `[v:`  | `[v:\xFF` |
//! | `$gt`  | `(v:\xFF` | `+` |
//! | `$gte` | `[v:`  | `+` |
//! | `$lt`  | `-` | `(v:` |
//! | `$lte` | `-` | `[v:\xFF` |
//!
//! `$ne` parses but contributes no scan.
//!
//! A STRING value may itself contain `:`, so its tokens can fall inside
//! another value's `$eq` range: `$eq "a"` scans `[a:` to `[a:\xFF` and also
//! returns the record whose value is `"a:b"` (token `a:b:3`). The bounds of
//! the other operators shift in the same way.

use crate::codec::encode_value;
use crate::config::IndexEncoding;
use crate::index_key::{index_value, parse_token_id, LEX_MAX, TOKEN_SEPARATOR};
use recordkv_core::{Error, KeySpace, LexBound, RecordId, Result, Schema, Value, ID_FIELD};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator of a predicate clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$eq`
    Eq,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$ne`, accepted but never narrows a query
    Ne,
}

impl Operator {
    /// Every operator, in declaration order
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Ne,
    ];

    /// Operator keyword, e.g. `"$gte"`
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Ne => "$ne",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown operator `{}`", s)))
    }
}

// ============================================================================
// Predicate
// ============================================================================

/// Condition on one field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Plain value: equality
    Equals(Value),
    /// Operator map, every entry must hold
    Compare(Vec<(Operator, Value)>),
}

/// Conjunction of field conditions
///
/// ```ignore
/// let adults_named_mark = Predicate::new().eq("name", "Mark").gte("age", 18);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<(String, Condition)>,
}

impl Predicate {
    /// Empty predicate; matches nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicate selecting one record by ID
    pub fn by_id(id: RecordId) -> Self {
        Self::new().eq(ID_FIELD, id.as_u64() as f64)
    }

    /// `field == value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.into(), Condition::Equals(value.into())));
        self
    }

    /// Add `field {op} value`; operators on the same field accumulate
    pub fn compare(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        let existing = self.clauses.iter_mut().find(|(name, cond)| {
            name == &field && matches!(cond, Condition::Compare(_))
        });
        match existing {
            Some((_, Condition::Compare(ops))) => ops.push((op, value)),
            _ => self
                .clauses
                .push((field, Condition::Compare(vec![(op, value)]))),
        }
        self
    }

    /// `field > value`
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, Operator::Gt, value)
    }

    /// `field >= value`
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, Operator::Gte, value)
    }

    /// `field < value`
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, Operator::Lt, value)
    }

    /// `field <= value`
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, Operator::Lte, value)
    }

    /// `field != value`; has no effect on results
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, Operator::Ne, value)
    }

    /// Clauses in insertion order
    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    /// True if no clause was added
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

// ============================================================================
// Translation
// ============================================================================

/// One `ZRANGEBYLEX` over a field index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeScan {
    /// Field being scanned
    pub field: String,
    /// Index key
    pub key: String,
    /// Lower bound
    pub min: LexBound,
    /// Upper bound
    pub max: LexBound,
}

/// Lexicographic bounds covering `op` against an index value
///
/// Returns `None` for `$ne`.
pub fn range_for(op: Operator, value: &str) -> Option<(LexBound, LexBound)> {
    let prefix = format!("{}{}", value, TOKEN_SEPARATOR);
    let past_prefix = format!("{}{}", prefix, LEX_MAX);
    let bounds = match op {
        Operator::Eq => (LexBound::Inclusive(prefix), LexBound::Inclusive(past_prefix)),
        Operator::Gt => (LexBound::Exclusive(past_prefix), LexBound::PosInf),
        Operator::Gte => (LexBound::Inclusive(prefix), LexBound::PosInf),
        Operator::Lt => (LexBound::NegInf, LexBound::Exclusive(prefix)),
        Operator::Lte => (LexBound::NegInf, LexBound::Inclusive(past_prefix)),
        Operator::Ne => return None,
    };
    Some(bounds)
}

/// Turns predicates into range scans for one collection
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    keys: KeySpace,
    schema: Arc<Schema>,
    encoding: IndexEncoding,
}

impl QueryTranslator {
    /// Create a translator for a collection
    pub fn new(keys: KeySpace, schema: Arc<Schema>, encoding: IndexEncoding) -> Self {
        Self {
            keys,
            schema,
            encoding,
        }
    }

    /// Scans for every clause of `predicate`, in clause order
    ///
    /// Fails with `UnknownField` for a field outside the schema (other than
    /// `id`) and with `Codec` for an operand of the wrong type.
    pub fn translate(&self, predicate: &Predicate) -> Result<Vec<RangeScan>> {
        let mut scans = Vec::new();
        for (field, condition) in predicate.clauses() {
            let field_type = self.schema.require(field)?;
            let operands: Vec<(Operator, &Value)> = match condition {
                Condition::Equals(value) => vec![(Operator::Eq, value)],
                Condition::Compare(ops) => ops.iter().map(|(op, v)| (*op, v)).collect(),
            };
            for (op, operand) in operands {
                let normalized = encode_value(field, field_type, operand)?;
                let value = index_value(self.encoding, field_type, &normalized)
                    .map_err(|reason| Error::codec(field.as_str(), reason))?;
                match range_for(op, &value) {
                    Some((min, max)) => scans.push(RangeScan {
                        field: field.clone(),
                        key: self.keys.index_key(field),
                        min,
                        max,
                    }),
                    None => debug!(
                        target: "recordkv::query",
                        collection = %self.keys.alias(),
                        field = %field,
                        "{} does not narrow the query; clause ignored",
                        op
                    ),
                }
            }
        }
        Ok(scans)
    }
}

// ============================================================================
// Result assembly
// ============================================================================

/// IDs carried by index members; unparsable members are logged and dropped
pub fn ids_from_tokens(tokens: &[String]) -> Vec<RecordId> {
    tokens
        .iter()
        .filter_map(|t| {
            let id = parse_token_id(t);
            if id.is_none() {
                warn!(target: "recordkv::query", token = %t, "Unparsable index member skipped");
            }
            id
        })
        .collect()
}

/// IDs present in every list, in the order of the first list, without
/// duplicates
pub fn intersect_ids(lists: Vec<Vec<RecordId>>) -> Vec<RecordId> {
    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };
    let others: Vec<HashSet<RecordId>> = lists.map(|l| l.into_iter().collect()).collect();
    let mut seen = HashSet::new();
    first
        .into_iter()
        .filter(|id| others.iter().all(|set| set.contains(id)))
        .filter(|id| seen.insert(*id))
        .collect()
}
