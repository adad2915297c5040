//! Index Encoding Tests
//!
//! `Lexical` keeps literal decimal tokens, so NUMBER ranges compare digit by
//! digit. `Ordered` tokens sort by magnitude.

use crate::common::*;

async fn five_ten_fifteen(encoding: IndexEncoding) -> (std::sync::Arc<MemoryStore>, Repository<MemoryStore>) {
    let config = RepositoryConfig::default().with_index_encoding(encoding);
    let (store, repo) = people(config).await;
    for (name, age) in [("five", 5), ("ten", 10), ("fifteen", 15)] {
        repo.insert(person(name, age)).await.unwrap();
    }
    (store, repo)
}

#[tokio::test]
async fn lexical_ranges_compare_digits() {
    let (store, repo) = five_ten_fifteen(IndexEncoding::Lexical).await;

    assert_eq!(
        index_members(&store, "people.age.index").await,
        vec!["10:2", "15:3", "5:1"]
    );

    let gte = repo.find(&Predicate::new().gte("age", 10)).await.unwrap();
    assert_eq!(names(&gte), vec!["ten", "fifteen", "five"]);

    let lt = repo.find(&Predicate::new().lt("age", 10)).await.unwrap();
    assert!(lt.is_empty());
}

#[tokio::test]
async fn lexical_equality_is_exact() {
    let (_store, repo) = five_ten_fifteen(IndexEncoding::Lexical).await;
    let found = repo.find(&Predicate::new().eq("age", 15)).await.unwrap();
    assert_eq!(names(&found), vec!["fifteen"]);
}

#[tokio::test]
async fn ordered_ranges_compare_magnitude() {
    let (store, repo) = five_ten_fifteen(IndexEncoding::Ordered).await;

    let members = index_members(&store, "people.age.index").await;
    let ids: Vec<&str> = members
        .iter()
        .filter_map(|m| m.rsplit_once(':').map(|(_, id)| id))
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let gte = repo.find(&Predicate::new().gte("age", 10)).await.unwrap();
    assert_eq!(names(&gte), vec!["ten", "fifteen"]);

    let lt = repo.find(&Predicate::new().lt("age", 10)).await.unwrap();
    assert_eq!(names(&lt), vec!["five"]);
}

#[tokio::test]
async fn hash_keeps_plain_values_under_ordered_encoding() {
    let (store, _repo) = five_ten_fifteen(IndexEncoding::Ordered).await;
    assert_eq!(store.hget("people:2", "age").await.unwrap().as_deref(), Some("10"));
}

#[tokio::test]
async fn config_loaded_from_toml_selects_encoding() {
    let config = RepositoryConfig::from_toml_str(
        r#"
        index_encoding = "lexical"
        id_allocation = "read_then_increment"
        "#,
    )
    .unwrap();
    let (store, repo) = people(config).await;
    repo.insert(person("Mark", 7)).await.unwrap();

    assert_eq!(index_members(&store, "people.age.index").await, vec!["7:1"]);
    assert_eq!(store.get("people__idincr").await.unwrap().as_deref(), Some("2"));
}
