//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

pub use chrono::{DateTime, Utc};
pub use recordkv::{
    CodecPolicy, Command, Error, FieldType, Fields, IdAllocation, Identified, IndexEncoding, LexBound,
    MemoryStore, Patch, Predicate, Record, RecordDb, RecordId, Repository, RepositoryConfig,
    Reply, Result, Schema, Store, Update, UpdateOptions, Value,
};
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs at DEBUG to the test writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

/// name: STRING, age: NUMBER, joined: DATE
pub fn people_schema() -> Schema {
    Schema::from_pairs([
        ("name", FieldType::String),
        ("age", FieldType::Number),
        ("joined", FieldType::Date),
    ])
    .unwrap()
}

/// Store plus an initialized `people` repository.
pub async fn people(config: RepositoryConfig) -> (Arc<MemoryStore>, Repository<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let repo = RecordDb::from_arc(Arc::clone(&store))
        .with_config(config)
        .create_repository("people", people_schema())
        .await
        .unwrap();
    (store, repo)
}

pub fn person(name: &str, age: i64) -> Fields {
    Fields::new().with("name", name).with("age", age)
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Names of found records, in result order.
pub fn names(found: &[Identified<Fields>]) -> Vec<String> {
    found
        .iter()
        .filter_map(|r| r.record.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

/// All members of an index sorted set.
pub async fn index_members(store: &MemoryStore, key: &str) -> Vec<String> {
    store
        .zrangebylex(key, LexBound::NegInf, LexBound::PosInf, None)
        .await
        .unwrap()
}

// ============================================================================
// Log capture
// ============================================================================

/// Layer counting WARN events.
struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Installs a thread-local WARN counter until the guard drops.
///
/// Only sees events emitted on the current thread, so use it from
/// current-thread runtimes.
pub fn count_warnings() -> (tracing::subscriber::DefaultGuard, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let layer = WarnCounter {
        count: Arc::clone(&count),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    (tracing::subscriber::set_default(subscriber), count)
}
