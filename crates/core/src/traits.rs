//! Store abstraction
//!
//! This module defines the [`Store`] trait, the only seam between the record
//! engine and its backing ordered key-value store, and the [`Batch`] handle
//! that queues commands for atomic execution.
//!
//! Implementations provide a single primitive, [`Store::execute`]. Every
//! typed command method is a default method that runs a one-command batch,
//! so a networked client and the in-process `MemoryStore` expose the exact
//! same surface.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::command::{Command, LexBound, Limit, Reply, ScoreBound};
use crate::error::{Error, Result};

/// Backing store contract
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple tasks (requires Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute commands as one atomic unit
    ///
    /// Either every command is applied, in order, and one reply per command
    /// is returned in submission order, or none is applied and the error is
    /// returned.
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>>;

    /// Run a single command
    async fn execute_one(&self, command: Command) -> Result<Reply> {
        let name = command.name();
        self.execute(vec![command])
            .await?
            .pop()
            .ok_or_else(|| Error::unexpected_reply(name, "no reply"))
    }

    // ========== Scalar ==========

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.execute_one(Command::Get { key: key.to_string() })
            .await?
            .into_optional_string("GET")
    }

    /// `SET key value`
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.execute_one(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await?
        .into_ok("SET")
    }

    /// `INCR key`, returning the incremented value
    async fn incr(&self, key: &str) -> Result<i64> {
        self.execute_one(Command::Incr { key: key.to_string() })
            .await?
            .into_integer("INCR")
    }

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> Result<bool> {
        let count = self
            .execute_one(Command::Exists {
                keys: vec![key.to_string()],
            })
            .await?
            .into_integer("EXISTS")?;
        Ok(count > 0)
    }

    /// `DEL key...`, returning how many keys were removed
    async fn del(&self, keys: &[&str]) -> Result<i64> {
        self.execute_one(Command::Del {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        })
        .await?
        .into_integer("DEL")
    }

    // ========== Hash ==========

    /// `HSET key field value...`, returning how many fields were new
    async fn hset(&self, key: &str, fields: &[(&str, &str)]) -> Result<i64> {
        self.execute_one(Command::HSet {
            key: key.to_string(),
            fields: owned_pairs(fields),
        })
        .await?
        .into_integer("HSET")
    }

    /// `HGET key field`
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.execute_one(Command::HGet {
            key: key.to_string(),
            field: field.to_string(),
        })
        .await?
        .into_optional_string("HGET")
    }

    /// `HGETALL key`; empty when the key is absent
    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        self.execute_one(Command::HGetAll { key: key.to_string() })
            .await?
            .into_hash("HGETALL")
    }

    /// `HMGET key field...`
    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.execute_one(Command::HMGet {
            key: key.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
        .await?
        .into_optional_array("HMGET")
    }

    /// `HDEL key field...`, returning how many fields were removed
    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<i64> {
        self.execute_one(Command::HDel {
            key: key.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
        .await?
        .into_integer("HDEL")
    }

    // ========== Sorted set ==========

    /// `ZADD key score member`, returning 1 if the member is new
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<i64> {
        self.execute_one(Command::ZAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        })
        .await?
        .into_integer("ZADD")
    }

    /// `ZREM key member...`, returning how many members were removed
    async fn zrem(&self, key: &str, members: &[&str]) -> Result<i64> {
        self.execute_one(Command::ZRem {
            key: key.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        })
        .await?
        .into_integer("ZREM")
    }

    /// `ZRANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]`
    ///
    /// With scores, the reply alternates member and score.
    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        with_scores: bool,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        self.execute_one(Command::ZRangeByScore {
            key: key.to_string(),
            min,
            max,
            with_scores,
            limit,
        })
        .await?
        .into_array("ZRANGEBYSCORE")
    }

    /// `ZRANGEBYLEX key min max [LIMIT offset count]`
    async fn zrangebylex(
        &self,
        key: &str,
        min: LexBound,
        max: LexBound,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        self.execute_one(Command::ZRangeByLex {
            key: key.to_string(),
            min,
            max,
            limit,
        })
        .await?
        .into_array("ZRANGEBYLEX")
    }

    // ========== Batch ==========

    /// Begin a batch of commands executed atomically by [`Batch::execute`]
    fn batch(&self) -> Batch<'_, Self>
    where
        Self: Sized,
    {
        Batch::new(self)
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
}

/// Queued commands awaiting atomic execution
///
/// Queue methods return `&mut Self` so calls can be chained; nothing reaches
/// the store until [`Batch::execute`].
#[must_use = "a batch does nothing until executed"]
pub struct Batch<'a, S: Store + ?Sized> {
    store: &'a S,
    commands: Vec<Command>,
}

impl<'a, S: Store + ?Sized> Batch<'a, S> {
    /// Start an empty batch against `store`
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            commands: Vec::new(),
        }
    }

    /// Queue an arbitrary command
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Queued commands
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queue `GET`
    pub fn get(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Get { key: key.into() })
    }

    /// Queue `SET`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Queue `INCR`
    pub fn incr(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Incr { key: key.into() })
    }

    /// Queue `EXISTS`
    pub fn exists(&mut self, keys: Vec<String>) -> &mut Self {
        self.push(Command::Exists { keys })
    }

    /// Queue `DEL`
    pub fn del(&mut self, keys: Vec<String>) -> &mut Self {
        self.push(Command::Del { keys })
    }

    /// Queue `HSET`
    pub fn hset(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.push(Command::HSet {
            key: key.into(),
            fields,
        })
    }

    /// Queue `HGET`
    pub fn hget(&mut self, key: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.push(Command::HGet {
            key: key.into(),
            field: field.into(),
        })
    }

    /// Queue `HGETALL`
    pub fn hgetall(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::HGetAll { key: key.into() })
    }

    /// Queue `HMGET`
    pub fn hmget(&mut self, key: impl Into<String>, fields: Vec<String>) -> &mut Self {
        self.push(Command::HMGet {
            key: key.into(),
            fields,
        })
    }

    /// Queue `HDEL`
    pub fn hdel(&mut self, key: impl Into<String>, fields: Vec<String>) -> &mut Self {
        self.push(Command::HDel {
            key: key.into(),
            fields,
        })
    }

    /// Queue `ZADD`
    pub fn zadd(&mut self, key: impl Into<String>, score: f64, member: impl Into<String>) -> &mut Self {
        self.push(Command::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
        })
    }

    /// Queue `ZREM`
    pub fn zrem(&mut self, key: impl Into<String>, members: Vec<String>) -> &mut Self {
        self.push(Command::ZRem {
            key: key.into(),
            members,
        })
    }

    /// Queue `ZRANGEBYSCORE`
    pub fn zrangebyscore(
        &mut self,
        key: impl Into<String>,
        min: ScoreBound,
        max: ScoreBound,
        with_scores: bool,
        limit: Option<Limit>,
    ) -> &mut Self {
        self.push(Command::ZRangeByScore {
            key: key.into(),
            min,
            max,
            with_scores,
            limit,
        })
    }

    /// Queue `ZRANGEBYLEX`
    pub fn zrangebylex(
        &mut self,
        key: impl Into<String>,
        min: LexBound,
        max: LexBound,
        limit: Option<Limit>,
    ) -> &mut Self {
        self.push(Command::ZRangeByLex {
            key: key.into(),
            min,
            max,
            limit,
        })
    }

    /// Run every queued command as one atomic unit
    ///
    /// Replies come back in submission order. An empty batch returns an
    /// empty reply list without touching the store.
    pub async fn execute(self) -> Result<Vec<Reply>> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }
        let expected = self.commands.len();
        let replies = self.store.execute(self.commands).await?;
        if replies.len() != expected {
            return Err(Error::Store(format!(
                "batch of {} commands returned {} replies",
                expected,
                replies.len()
            )));
        }
        Ok(replies)
    }
}
