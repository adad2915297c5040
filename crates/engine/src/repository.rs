//! Collection repository
//!
//! A [`Repository`] stores records of one schema under one alias. Every
//! mutation is queued on a single [`Batch`](recordkv_core::Batch) so the
//! record hash and its index entries change together. Reads needed to plan
//! a mutation (the ID counter, pre-images for update and delete) happen
//! before the batch and are not isolated from concurrent writers.

use crate::codec::{decode_record, encode_record, FieldError, NormalizedRecord};
use crate::config::{CodecPolicy, IdAllocation, RepositoryConfig};
use crate::index::IndexManager;
use crate::query::{ids_from_tokens, intersect_ids, Predicate, QueryTranslator};
use crate::update::{Patch, Update, UpdateOptions};
use recordkv_core::{
    Batch, Error, Fields, Identified, KeySpace, Record, RecordId, Result, Schema, Store, ID_FIELD,
};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Typed access to one collection
pub struct Repository<S: Store, R: Record = Fields> {
    store: Arc<S>,
    keys: KeySpace,
    schema: Arc<Schema>,
    config: RepositoryConfig,
    index: IndexManager,
    translator: QueryTranslator,
    _record: PhantomData<fn() -> R>,
}

impl<S: Store, R: Record> Clone for Repository<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            schema: Arc::clone(&self.schema),
            config: self.config,
            index: self.index.clone(),
            translator: self.translator.clone(),
            _record: PhantomData,
        }
    }
}

impl<S: Store, R: Record> std::fmt::Debug for Repository<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("alias", &self.keys.alias())
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish()
    }
}

impl<S: Store, R: Record> Repository<S, R> {
    /// Create a repository with the default configuration
    ///
    /// Does not touch the store; see [`Repository::initialize`].
    pub fn new(store: Arc<S>, alias: impl Into<String>, schema: Schema) -> Result<Self> {
        Self::with_config(store, alias, schema, RepositoryConfig::default())
    }

    /// Create a repository with an explicit configuration
    pub fn with_config(
        store: Arc<S>,
        alias: impl Into<String>,
        schema: Schema,
        config: RepositoryConfig,
    ) -> Result<Self> {
        let keys = KeySpace::new(alias)?;
        let schema = Arc::new(schema);
        Ok(Self {
            index: IndexManager::new(keys.clone(), Arc::clone(&schema), config.index_encoding),
            translator: QueryTranslator::new(
                keys.clone(),
                Arc::clone(&schema),
                config.index_encoding,
            ),
            store,
            keys,
            schema,
            config,
            _record: PhantomData,
        })
    }

    /// Create and initialize a repository
    pub async fn open(
        store: Arc<S>,
        alias: impl Into<String>,
        schema: Schema,
        config: RepositoryConfig,
    ) -> Result<Self> {
        let repo = Self::with_config(store, alias, schema, config)?;
        repo.initialize().await?;
        Ok(repo)
    }

    /// Collection alias
    pub fn alias(&self) -> &str {
        self.keys.alias()
    }

    /// Key layout of this collection
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Declared fields
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create the ID counter with value 1 if it does not exist
    pub async fn initialize(&self) -> Result<()> {
        let counter = self.keys.counter_key();
        if self.store.exists(&counter).await? {
            debug!(collection = %self.alias(), "ID counter already present");
            return Ok(());
        }
        self.store.set(&counter, "1").await?;
        info!(collection = %self.alias(), "ID counter created");
        Ok(())
    }

    // ========== Insert ==========

    /// Store a new record and return it with its assigned ID
    pub async fn insert(&self, record: R) -> Result<Identified<R>> {
        let mut normalized = self.encode("insert", &record.to_fields())?;
        let id = self.allocate_id().await?;
        normalized.insert(ID_FIELD.to_string(), id.to_string());

        let mut batch = self.store.batch();
        batch.hset(self.keys.record_key(id), hash_pairs(&normalized));
        self.index.add_record(&mut batch, &normalized, id)?;
        if self.config.id_allocation == IdAllocation::ReadThenIncrement {
            batch.incr(self.keys.counter_key());
        }
        batch.execute().await?;

        debug!(collection = %self.alias(), id = %id, "Record inserted");
        Ok(Identified::new(id, record))
    }

    async fn allocate_id(&self) -> Result<RecordId> {
        let counter = self.keys.counter_key();
        match self.config.id_allocation {
            IdAllocation::Atomic => {
                let mut next = self.store.incr(&counter).await?;
                if next == 1 {
                    // The counter was absent; INCR just created it at 1.
                    info!(collection = %self.alias(), "ID counter created on first insert");
                    next = self.store.incr(&counter).await?;
                }
                u64::try_from(next - 1)
                    .ok()
                    .filter(|id| *id > 0)
                    .map(RecordId::new)
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "ID counter {} holds {}, expected a positive value",
                            counter,
                            next - 1
                        ))
                    })
            }
            IdAllocation::ReadThenIncrement => {
                let raw = self
                    .store
                    .get(&counter)
                    .await?
                    .ok_or_else(|| Error::CounterMissing(counter.clone()))?;
                raw.parse::<u64>().map(RecordId::new).map_err(|_| {
                    Error::InvalidArgument(format!(
                        "ID counter {} holds non-integer `{}`",
                        counter, raw
                    ))
                })
            }
        }
    }

    // ========== Find ==========

    /// IDs of the records matching `predicate`
    ///
    /// All range scans run in one batch. A predicate that yields no scan
    /// (empty, or only `$ne`) matches nothing.
    pub async fn find_ids(&self, predicate: &Predicate) -> Result<Vec<RecordId>> {
        let scans = self.translator.translate(predicate)?;
        if scans.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.store.batch();
        for scan in &scans {
            batch.zrangebylex(scan.key.clone(), scan.min.clone(), scan.max.clone(), None);
        }
        let lists = batch
            .execute()
            .await?
            .into_iter()
            .map(|reply| reply.into_array("ZRANGEBYLEX").map(|t| ids_from_tokens(&t)))
            .collect::<Result<Vec<_>>>()?;

        let ids = intersect_ids(lists);
        debug!(
            collection = %self.alias(),
            scans = scans.len(),
            matched = ids.len(),
            "Query resolved"
        );
        Ok(ids)
    }

    /// Records matching `predicate`, in index order of the first clause
    pub async fn find(&self, predicate: &Predicate) -> Result<Vec<Identified<R>>> {
        let ids = self.find_ids(predicate).await?;
        self.fetch(ids).await
    }

    /// First record matching `predicate`
    ///
    /// Matches whose hash is gone or unreadable are passed over in favour of
    /// the next one.
    pub async fn find_one(&self, predicate: &Predicate) -> Result<Option<Identified<R>>> {
        for id in self.find_ids(predicate).await? {
            if let Some(found) = self.fetch(vec![id]).await?.into_iter().next() {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Record stored under `id`, read directly from its hash
    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<Identified<R>>> {
        let raw = self.store.hgetall(&self.keys.record_key(id)).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        self.decode(id, &raw)
    }

    /// Load record hashes in one batch; IDs whose hash is gone are skipped
    async fn fetch(&self, ids: Vec<RecordId>) -> Result<Vec<Identified<R>>> {
        let mut batch = self.store.batch();
        for id in &ids {
            batch.hgetall(self.keys.record_key(*id));
        }
        let replies = batch.execute().await?;

        let mut records = Vec::with_capacity(ids.len());
        for (id, reply) in ids.into_iter().zip(replies) {
            let raw = reply.into_hash("HGETALL")?;
            if raw.is_empty() {
                debug!(collection = %self.alias(), id = %id, "Indexed record has no hash");
                continue;
            }
            if let Some(record) = self.decode(id, &raw)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Decode a stored hash into `R`
    ///
    /// Under `BestEffort` a record that `R` cannot be built from is logged
    /// and yields `None`; under `Strict` it is an error.
    fn decode(
        &self,
        key_id: RecordId,
        raw: &BTreeMap<String, String>,
    ) -> Result<Option<Identified<R>>> {
        let decoded = decode_record(&self.schema, raw);
        self.settle("decode", decoded.failures)?;
        let id = decoded.id.unwrap_or(key_id);
        match R::from_fields(decoded.fields) {
            Ok(record) => Ok(Some(Identified::new(id, record))),
            Err(e) if self.config.codec_policy == CodecPolicy::BestEffort => {
                warn!(
                    collection = %self.alias(),
                    id = %id,
                    error = %e,
                    "Unreadable record skipped"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ========== Update ==========

    /// Rewrite the first match, or every match with `multi`
    ///
    /// Returns the number of records updated.
    pub async fn update(
        &self,
        search: &Predicate,
        update: Update<R>,
        options: UpdateOptions,
    ) -> Result<usize> {
        match update {
            Update::Replace(record) => {
                let normalized = self.encode("update", &record.to_fields())?;
                self.replace(search, &normalized, options).await
            }
            Update::Patch(patch) => {
                patch.validate(&self.schema)?;
                let set = self.encode("update", patch.set_fields())?;
                self.patch(search, &set, &patch, options).await
            }
        }
    }

    async fn replace(
        &self,
        search: &Predicate,
        normalized: &NormalizedRecord,
        options: UpdateOptions,
    ) -> Result<usize> {
        let targets = self.targets(search, options).await?;
        let mut batch = self.store.batch();
        let mut updated = 0;

        for id in targets {
            let key = self.keys.record_key(id);
            let previous = self.store.hgetall(&key).await?;
            if previous.is_empty() {
                continue;
            }

            batch.del(vec![key.clone()]);
            self.index.remove_record(&mut batch, &previous, id);

            let mut fresh = normalized.clone();
            fresh.insert(ID_FIELD.to_string(), id.to_string());
            batch.hset(key, hash_pairs(&fresh));
            self.index.add_record(&mut batch, &fresh, id)?;
            updated += 1;
        }

        self.commit_update(batch, updated).await
    }

    async fn patch(
        &self,
        search: &Predicate,
        set: &NormalizedRecord,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<usize> {
        let targets = self.targets(search, options).await?;
        let unset: Vec<String> = patch.unset_fields().iter().cloned().collect();
        let affected: Vec<&str> = set
            .keys()
            .map(String::as_str)
            .chain(unset.iter().map(String::as_str))
            .collect();
        let mut wanted = vec![ID_FIELD];
        wanted.extend(affected.iter().copied());

        let mut batch = self.store.batch();
        let mut updated = 0;

        for id in targets {
            let key = self.keys.record_key(id);
            let mut values = self.store.hmget(&key, &wanted).await?.into_iter();
            if values.next().flatten().is_none() {
                continue;
            }
            let previous: NormalizedRecord = affected
                .iter()
                .zip(values)
                .filter_map(|(field, old)| old.map(|old| (field.to_string(), old)))
                .collect();

            if !set.is_empty() {
                for field in set.keys() {
                    if let Some(old) = previous.get(field) {
                        self.index.remove_entry(&mut batch, field, old, id);
                    }
                }
                batch.hset(key.clone(), hash_pairs(set));
                self.index.add_record(&mut batch, set, id)?;
            }
            if !unset.is_empty() {
                batch.hdel(key, unset.clone());
                for field in &unset {
                    if let Some(old) = previous.get(field) {
                        self.index.remove_entry(&mut batch, field, old, id);
                    }
                }
            }
            updated += 1;
        }

        self.commit_update(batch, updated).await
    }

    async fn commit_update(&self, batch: Batch<'_, S>, updated: usize) -> Result<usize> {
        let commands = batch.len();
        batch.execute().await?;
        debug!(
            collection = %self.alias(),
            updated,
            commands,
            "Update committed"
        );
        Ok(updated)
    }

    // ========== Delete ==========

    /// Remove the first match, or every match with `multi`, with their index
    /// entries
    ///
    /// Returns the number of records deleted.
    pub async fn delete(&self, search: &Predicate, options: UpdateOptions) -> Result<usize> {
        let targets = self.targets(search, options).await?;
        let mut batch = self.store.batch();
        let mut deleted = 0;

        for id in targets {
            let key = self.keys.record_key(id);
            let previous = self.store.hgetall(&key).await?;
            if previous.is_empty() {
                continue;
            }
            batch.del(vec![key]);
            self.index.remove_record(&mut batch, &previous, id);
            deleted += 1;
        }

        batch.execute().await?;
        debug!(collection = %self.alias(), deleted, "Delete committed");
        Ok(deleted)
    }

    // ========== Helpers ==========

    async fn targets(&self, search: &Predicate, options: UpdateOptions) -> Result<Vec<RecordId>> {
        let mut ids = self.find_ids(search).await?;
        if !options.multi {
            ids.truncate(1);
        }
        Ok(ids)
    }

    fn encode(&self, operation: &'static str, fields: &Fields) -> Result<NormalizedRecord> {
        let encoded = encode_record(&self.schema, fields);
        self.settle(operation, encoded.failures)?;
        Ok(encoded.normalized)
    }

    /// Apply the codec policy to field failures
    fn settle(&self, operation: &'static str, failures: Vec<FieldError>) -> Result<()> {
        match self.config.codec_policy {
            CodecPolicy::Strict => match failures.into_iter().next() {
                Some(first) => Err(first.into()),
                None => Ok(()),
            },
            CodecPolicy::BestEffort => {
                for failure in failures {
                    warn!(
                        collection = %self.alias(),
                        field = %failure.field,
                        reason = %failure.reason,
                        operation,
                        "Field omitted"
                    );
                }
                Ok(())
            }
        }
    }
}

fn hash_pairs(record: &NormalizedRecord) -> Vec<(String, String)> {
    record
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
