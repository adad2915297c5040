//! MemoryStore: in-process implementation of the store contract
//!
//! This module implements the `Store` trait using:
//! - `HashMap<String, Entry>` for the keyspace
//! - `parking_lot::RwLock` for thread-safe access
//! - A staging overlay per batch for all-or-nothing execution
//!
//! # Design Notes
//!
//! - **No durability**: state lives in memory only and is lost on drop
//! - **Atomic batches**: a batch runs against a private overlay holding
//!   copies of the keys it touches; the overlay is merged into the keyspace
//!   under the same write lock only if every command succeeded
//! - **Read-only batches** take the read lock and never merge
//! - **Copy cost**: staging clones each touched entry once per batch, which
//!   is O(entry size); acceptable for a reference backend
//! - **Empty containers**: hashes and sorted sets left empty by a batch are
//!   removed from the keyspace

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use recordkv_core::{Command, Error, Reply, Result, Store};

use crate::entry::Entry;
use crate::sorted_set::SortedSet;

/// In-memory store backend
///
/// Cloning shares the underlying keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    batches: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no keys are held
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// All key names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of batches executed so far (single commands count as one)
    pub fn batches_executed(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Run commands against the keyspace atomically
    fn apply(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        self.batches.fetch_add(1, Ordering::SeqCst);

        if commands.iter().all(Command::is_read_only) {
            let data = self.data.read();
            let mut staged = Staged::new(&data);
            return commands.iter().map(|c| staged.run(c)).collect();
        }

        // Hold the write lock across staging and merge so no reader observes
        // a partially applied batch
        let mut data = self.data.write();
        let mut staged = Staged::new(&data);
        let replies = commands
            .iter()
            .map(|c| staged.run(c))
            .collect::<Result<Vec<_>>>()?;
        let changes = staged.into_changes();

        for (key, entry) in changes {
            match entry {
                Some(entry) if !entry.is_empty() => {
                    data.insert(key, entry);
                }
                _ => {
                    data.remove(&key);
                }
            }
        }
        Ok(replies)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let count = commands.len();
        let replies = self.apply(commands)?;
        trace!(commands = count, "memory store executed batch");
        Ok(replies)
    }
}

// ============================================================================
// Staging overlay
// ============================================================================

/// Copy-on-write view of the keyspace for one batch
///
/// `changes` maps a touched key to its pending state: `Some(entry)` to
/// write, `None` to delete.
struct Staged<'a> {
    base: &'a HashMap<String, Entry>,
    changes: HashMap<String, Option<Entry>>,
}

impl<'a> Staged<'a> {
    fn new(base: &'a HashMap<String, Entry>) -> Self {
        Self {
            base,
            changes: HashMap::new(),
        }
    }

    fn into_changes(self) -> HashMap<String, Option<Entry>> {
        self.changes
    }

    /// Current entry for a key, pending changes first
    fn read(&self, key: &str) -> Option<&Entry> {
        match self.changes.get(key) {
            Some(pending) => pending.as_ref(),
            None => self.base.get(key),
        }
    }

    /// Writable slot for a key, copied from the base on first touch
    fn slot(&mut self, key: &str) -> &mut Option<Entry> {
        let base = self.base;
        self.changes
            .entry(key.to_string())
            .or_insert_with(|| base.get(key).cloned())
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut BTreeMap<String, String>> {
        self.slot(key)
            .get_or_insert_with(|| Entry::Hash(BTreeMap::new()))
            .as_hash_mut(key)
    }

    fn zset_mut(&mut self, key: &str) -> Result<&mut SortedSet> {
        self.slot(key)
            .get_or_insert_with(|| Entry::ZSet(SortedSet::new()))
            .as_zset_mut(key)
    }

    fn run(&mut self, command: &Command) -> Result<Reply> {
        match command {
            Command::Get { key } => match self.read(key) {
                Some(entry) => Ok(Reply::Bulk(entry.as_str(key)?.to_string())),
                None => Ok(Reply::Nil),
            },
            Command::Set { key, value } => {
                *self.slot(key) = Some(Entry::Str(value.clone()));
                Ok(Reply::Ok)
            }
            Command::Incr { key } => {
                let current = match self.read(key) {
                    Some(entry) => entry.as_str(key)?.parse::<i64>().map_err(|_| {
                        Error::InvalidArgument("value is not an integer or out of range".into())
                    })?,
                    None => 0,
                };
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| Error::InvalidArgument("increment would overflow".into()))?;
                *self.slot(key) = Some(Entry::Str(next.to_string()));
                Ok(Reply::Integer(next))
            }
            Command::Exists { keys } => {
                let count = keys.iter().filter(|k| self.read(k).is_some()).count();
                Ok(Reply::Integer(count as i64))
            }
            Command::Del { keys } => {
                let mut removed = 0;
                for key in keys {
                    if self.read(key).is_some() {
                        *self.slot(key) = None;
                        removed += 1;
                    }
                }
                Ok(Reply::Integer(removed))
            }
            Command::HSet { key, fields } => {
                let hash = self.hash_mut(key)?;
                let added = fields
                    .iter()
                    .filter(|(f, v)| hash.insert(f.clone(), v.clone()).is_none())
                    .count();
                Ok(Reply::Integer(added as i64))
            }
            Command::HGet { key, field } => match self.read(key) {
                Some(entry) => Ok(entry
                    .as_hash(key)?
                    .get(field)
                    .map_or(Reply::Nil, |v| Reply::Bulk(v.clone()))),
                None => Ok(Reply::Nil),
            },
            Command::HGetAll { key } => match self.read(key) {
                Some(entry) => Ok(Reply::Hash(entry.as_hash(key)?.clone())),
                None => Ok(Reply::Hash(BTreeMap::new())),
            },
            Command::HMGet { key, fields } => {
                let values = match self.read(key) {
                    Some(entry) => {
                        let hash = entry.as_hash(key)?;
                        fields.iter().map(|f| hash.get(f).cloned()).collect()
                    }
                    None => vec![None; fields.len()],
                };
                Ok(Reply::OptionalArray(values))
            }
            Command::HDel { key, fields } => {
                if self.read(key).is_none() {
                    return Ok(Reply::Integer(0));
                }
                let hash = self.hash_mut(key)?;
                let removed = fields.iter().filter(|f| hash.remove(*f).is_some()).count();
                Ok(Reply::Integer(removed as i64))
            }
            Command::ZAdd { key, score, member } => {
                if score.is_nan() {
                    return Err(Error::InvalidArgument("score is not a valid float".into()));
                }
                let added = self.zset_mut(key)?.insert(member.clone(), *score);
                Ok(Reply::Integer(i64::from(added)))
            }
            Command::ZRem { key, members } => {
                if self.read(key).is_none() {
                    return Ok(Reply::Integer(0));
                }
                let zset = self.zset_mut(key)?;
                let removed = members.iter().filter(|m| zset.remove(m)).count();
                Ok(Reply::Integer(removed as i64))
            }
            Command::ZRangeByScore {
                key,
                min,
                max,
                with_scores,
                limit,
            } => {
                let entries = match self.read(key) {
                    Some(entry) => entry.as_zset(key)?.range_by_score(*min, *max, *limit),
                    None => Vec::new(),
                };
                let items = if *with_scores {
                    entries
                        .into_iter()
                        .flat_map(|(member, score)| [member, score.to_string()])
                        .collect()
                } else {
                    entries.into_iter().map(|(member, _)| member).collect()
                };
                Ok(Reply::Array(items))
            }
            Command::ZRangeByLex {
                key,
                min,
                max,
                limit,
            } => {
                let members = match self.read(key) {
                    Some(entry) => entry.as_zset(key)?.range_by_lex(min, max, *limit),
                    None => Vec::new(),
                };
                Ok(Reply::Array(members))
            }
        }
    }
}
