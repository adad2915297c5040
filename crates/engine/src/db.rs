//! Repository registry
//!
//! `RecordDb` owns the store connection and hands out repositories that
//! share it.

use crate::config::RepositoryConfig;
use crate::repository::Repository;
use recordkv_core::{Fields, Record, Result, Schema, Store};
use std::path::Path;
use std::sync::Arc;

/// Shared store plus repository defaults
pub struct RecordDb<S: Store> {
    store: Arc<S>,
    config: RepositoryConfig,
}

impl<S: Store> Clone for RecordDb<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
        }
    }
}

impl<S: Store> RecordDb<S> {
    /// Wrap a store with the default configuration
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Wrap an already shared store
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            config: RepositoryConfig::default(),
        }
    }

    /// Replace the configuration used by repositories created afterwards
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file
    pub fn with_config_file(self, path: &Path) -> Result<Self> {
        let config = RepositoryConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Shared store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Configuration handed to new repositories
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Open an untyped repository and make sure its ID counter exists
    pub async fn create_repository(
        &self,
        alias: impl Into<String>,
        schema: Schema,
    ) -> Result<Repository<S, Fields>> {
        self.repository(alias, schema).await
    }

    /// Open a repository mapping records to `R`
    pub async fn repository<R: Record>(
        &self,
        alias: impl Into<String>,
        schema: Schema,
    ) -> Result<Repository<S, R>> {
        Repository::open(Arc::clone(&self.store), alias, schema, self.config).await
    }
}
