//! Find Tests
//!
//! Predicate resolution through the field indexes.

use crate::common::*;

async fn seeded(config: RepositoryConfig) -> (std::sync::Arc<MemoryStore>, Repository<MemoryStore>) {
    let (store, repo) = people(config).await;
    repo.insert(person("Ann", 5).with("joined", at(1_000)))
        .await
        .unwrap();
    repo.insert(person("Bob", 10).with("joined", at(2_000)))
        .await
        .unwrap();
    repo.insert(person("Cid", 15).with("joined", at(3_000)))
        .await
        .unwrap();
    (store, repo)
}

// ============================================================================
// Equality
// ============================================================================

#[tokio::test]
async fn exact_match_on_every_field() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let by_name = repo.find(&Predicate::new().eq("name", "Bob")).await.unwrap();
    let by_age = repo.find(&Predicate::new().eq("age", 10)).await.unwrap();
    let by_date = repo.find(&Predicate::new().eq("joined", at(2_000))).await.unwrap();
    let by_id = repo.find(&Predicate::by_id(RecordId::new(2))).await.unwrap();

    for found in [by_name, by_age, by_date, by_id] {
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, RecordId::new(2));
        assert_eq!(found[0].record.get("name"), Some(&Value::from("Bob")));
        assert_eq!(found[0].record.get("age"), Some(&Value::Number(10.0)));
        assert_eq!(found[0].record.get("joined"), Some(&Value::Date(at(2_000))));
    }
}

#[tokio::test]
async fn date_literal_matches_its_whole_second() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    let with_millis = DateTime::from_timestamp(2_000, 750_000_000).unwrap();

    let found = repo.find(&Predicate::new().eq("joined", with_millis)).await.unwrap();
    assert_eq!(names(&found), vec!["Bob"]);
}

#[tokio::test]
async fn equality_does_not_match_prefixes() {
    let (_store, repo) = people(RepositoryConfig::default()).await;
    repo.insert(person("Ann", 1)).await.unwrap();
    repo.insert(person("Anna", 1)).await.unwrap();

    let found = repo.find(&Predicate::new().eq("name", "Ann")).await.unwrap();
    assert_eq!(names(&found), vec!["Ann"]);
}

#[tokio::test]
async fn equality_on_string_overlaps_values_with_separator() {
    let (_store, repo) = people(RepositoryConfig::default()).await;
    repo.insert(person("a", 1)).await.unwrap();
    repo.insert(person("a:b", 1)).await.unwrap();

    // token "a:b:2" lies inside the "a:" .. "a:\xFF" range
    let found = repo.find(&Predicate::new().eq("name", "a")).await.unwrap();
    assert_eq!(names(&found), vec!["a", "a:b"]);
}

#[tokio::test]
async fn clauses_on_different_fields_intersect() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    repo.insert(person("Bob", 15)).await.unwrap();

    let found = repo
        .find(&Predicate::new().eq("name", "Bob").eq("age", 15))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, RecordId::new(4));
}

// ============================================================================
// Ranges
// ============================================================================

#[tokio::test]
async fn numeric_ranges_follow_magnitude() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let gte = repo.find(&Predicate::new().gte("age", 10)).await.unwrap();
    assert_eq!(names(&gte), vec!["Bob", "Cid"]);

    let lt = repo.find(&Predicate::new().lt("age", 10)).await.unwrap();
    assert_eq!(names(&lt), vec!["Ann"]);

    let gt = repo.find(&Predicate::new().gt("age", 10)).await.unwrap();
    assert_eq!(names(&gt), vec!["Cid"]);

    let lte = repo.find(&Predicate::new().lte("age", 10)).await.unwrap();
    assert_eq!(names(&lte), vec!["Ann", "Bob"]);
}

#[tokio::test]
async fn negative_and_fractional_numbers_order() {
    let (_store, repo) = people(RepositoryConfig::default()).await;
    for (name, age) in [("a", -20.0), ("b", -2.5), ("c", 0.5), ("d", 3.0)] {
        repo.insert(Fields::new().with("name", name).with("age", age))
            .await
            .unwrap();
    }

    let found = repo.find(&Predicate::new().lt("age", -2)).await.unwrap();
    assert_eq!(names(&found), vec!["a", "b"]);

    let found = repo.find(&Predicate::new().gte("age", -2.5)).await.unwrap();
    assert_eq!(names(&found), vec!["b", "c", "d"]);
}

#[tokio::test]
async fn two_operators_bound_a_range() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let found = repo
        .find(&Predicate::new().gt("age", 5).lt("age", 15))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Bob"]);
}

#[tokio::test]
async fn date_ranges() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let found = repo
        .find(&Predicate::new().gte("joined", at(2_000)))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Bob", "Cid"]);
}

#[tokio::test]
async fn string_ranges_are_lexicographic() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let found = repo.find(&Predicate::new().lt("name", "Bob")).await.unwrap();
    assert_eq!(names(&found), vec!["Ann"]);

    let found = repo.find(&Predicate::new().gte("name", "Bob")).await.unwrap();
    assert_eq!(names(&found), vec!["Bob", "Cid"]);
}

#[tokio::test]
async fn id_ranges() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let found = repo.find(&Predicate::new().gt("id", 1)).await.unwrap();
    assert_eq!(names(&found), vec!["Bob", "Cid"]);
}

// ============================================================================
// No-constraint predicates and errors
// ============================================================================

#[tokio::test]
async fn ne_alone_matches_nothing() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    let found = repo.find(&Predicate::new().ne("name", "Ann")).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn ne_beside_other_clauses_is_ignored() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    let found = repo
        .find(&Predicate::new().ne("name", "Bob").gte("age", 10))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Bob", "Cid"]);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    let err = repo
        .find(&Predicate::new().eq("email", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField(f) if f == "email"));
}

#[tokio::test]
async fn no_match_is_empty() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;
    let found = repo.find(&Predicate::new().eq("name", "Zed")).await.unwrap();
    assert!(found.is_empty());
}

// ============================================================================
// find_one / find_by_id
// ============================================================================

#[tokio::test]
async fn find_one_returns_first_match() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let first = repo
        .find_one(&Predicate::new().gte("age", 10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, RecordId::new(2));

    assert!(repo
        .find_one(&Predicate::new().eq("name", "Zed"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn find_by_id_reads_the_hash() {
    let (_store, repo) = seeded(RepositoryConfig::default()).await;

    let found = repo.find_by_id(RecordId::new(3)).await.unwrap().unwrap();
    assert_eq!(found.record.get("name"), Some(&Value::from("Cid")));
    assert!(repo.find_by_id(RecordId::new(30)).await.unwrap().is_none());
}

#[tokio::test]
async fn orphaned_index_entry_is_skipped() {
    let (store, repo) = seeded(RepositoryConfig::default()).await;
    store.del(&["people:2"]).await.unwrap();

    let found = repo.find(&Predicate::new().gte("age", 5)).await.unwrap();
    assert_eq!(names(&found), vec!["Ann", "Cid"]);
}

#[tokio::test]
async fn find_one_passes_over_orphaned_first_match() {
    let (store, repo) = seeded(RepositoryConfig::default()).await;
    store.del(&["people:1"]).await.unwrap();

    let first = repo
        .find_one(&Predicate::new().gte("age", 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, RecordId::new(2));
    assert_eq!(first.record.get("name"), Some(&Value::from("Bob")));
}
