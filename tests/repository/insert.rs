//! Insert Tests
//!
//! - ID allocation from the collection counter
//! - Hash and index layout of a stored record
//! - Codec policy on bad field values

use crate::common::*;

// ============================================================================
// ID allocation
// ============================================================================

#[tokio::test]
async fn ids_start_at_one_and_increase() {
    let (_store, repo) = people(RepositoryConfig::default()).await;

    let mut ids = Vec::new();
    for (i, name) in ["Ann", "Bob", "Cid"].into_iter().enumerate() {
        ids.push(repo.insert(person(name, 20 + i as i64)).await.unwrap().id);
    }

    assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(3)]);
}

#[tokio::test]
async fn read_then_increment_allocates_from_counter() {
    let config = RepositoryConfig::default().with_id_allocation(IdAllocation::ReadThenIncrement);
    let (store, repo) = people(config).await;

    let first = repo.insert(person("Ann", 20)).await.unwrap();
    let second = repo.insert(person("Bob", 21)).await.unwrap();

    assert_eq!(first.id, RecordId::new(1));
    assert_eq!(second.id, RecordId::new(2));
    assert_eq!(store.get("people__idincr").await.unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn assigned_id_matches_counter_at_insert_time() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    store.set("people__idincr", "41").await.unwrap();

    let stored = repo.insert(person("Ann", 20)).await.unwrap();
    assert_eq!(stored.id, RecordId::new(41));

    let found = repo
        .find(&Predicate::by_id(stored.id))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Ann"]);
}

// ============================================================================
// Layout
// ============================================================================

#[tokio::test]
async fn insert_writes_hash_and_one_entry_per_field() {
    let (store, repo) = people(RepositoryConfig::legacy()).await;
    let record = person("Mark", 30).with("joined", at(1_700_000_000));
    repo.insert(record).await.unwrap();

    let hash = store.hgetall("people:1").await.unwrap();
    assert_eq!(hash.len(), 4);
    assert_eq!(hash["name"], "Mark");
    assert_eq!(hash["age"], "30");
    assert_eq!(hash["joined"], "1700000000");
    assert_eq!(hash["id"], "1");

    assert_eq!(index_members(&store, "people.name.index").await, vec!["Mark:1"]);
    assert_eq!(index_members(&store, "people.age.index").await, vec!["30:1"]);
    assert_eq!(
        index_members(&store, "people.joined.index").await,
        vec!["1700000000:1"]
    );
    assert_eq!(index_members(&store, "people.id.index").await, vec!["1:1"]);
}

#[tokio::test]
async fn insert_returns_caller_record_with_id() {
    let (_store, repo) = people(RepositoryConfig::default()).await;
    let record = person("Mark", 30).with("nickname", "M");

    let stored = repo.insert(record.clone()).await.unwrap();
    assert_eq!(stored.record, record);
}

#[tokio::test]
async fn falsy_values_are_not_stored() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    repo.insert(Fields::new().with("name", "").with("age", 0))
        .await
        .unwrap();

    let hash = store.hgetall("people:1").await.unwrap();
    assert_eq!(hash.keys().collect::<Vec<_>>(), vec!["id"]);
    assert!(!store.contains_key("people.name.index"));
    assert!(!store.contains_key("people.age.index"));
}

#[tokio::test]
async fn fields_outside_schema_are_ignored() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    repo.insert(person("Mark", 30).with("email", "m@example.com"))
        .await
        .unwrap();

    assert!(store.hget("people:1", "email").await.unwrap().is_none());
    assert!(!store.contains_key("people.email.index"));
}

// ============================================================================
// Codec policy
// ============================================================================

#[tokio::test(flavor = "current_thread")]
async fn best_effort_logs_and_omits_bad_field() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    let (_guard, warnings) = count_warnings();

    let bad = Fields::new().with("name", "Mark").with("age", "thirty");
    repo.insert(bad).await.unwrap();

    assert_eq!(warnings.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(store.hget("people:1", "age").await.unwrap().is_none());
    assert_eq!(
        store.hget("people:1", "name").await.unwrap().as_deref(),
        Some("Mark")
    );
}

#[tokio::test]
async fn strict_rejects_bad_field_and_writes_nothing() {
    let config = RepositoryConfig::default().with_codec_policy(CodecPolicy::Strict);
    let (store, repo) = people(config).await;

    let bad = Fields::new().with("name", "Mark").with("age", f64::NAN);
    // NaN is falsy and skipped before encoding
    repo.insert(bad).await.unwrap();

    let bad = Fields::new().with("name", "Mark").with("age", f64::INFINITY);
    let err = repo.insert(bad).await.unwrap_err();
    assert!(matches!(err, Error::Codec { ref field, .. } if field == "age"));

    assert_eq!(store.keys().iter().filter(|k| k.starts_with("people:")).count(), 1);
}
