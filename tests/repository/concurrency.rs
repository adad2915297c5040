//! Concurrency Tests
//!
//! Inserts racing on one collection, from a multi-threaded runtime and from
//! interleaved tasks on a single thread.

use crate::common::*;
use std::collections::HashSet;
use std::sync::Arc;

const TASKS: usize = 8;
const PER_TASK: usize = 25;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn atomic_allocation_yields_unique_ids() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    let repo = Arc::new(repo);

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                let mut ids = Vec::with_capacity(PER_TASK);
                for i in 0..PER_TASK {
                    let name = format!("t{}-{}", task, i);
                    let stored = repo.insert(person(&name, 1 + i as i64)).await.unwrap();
                    ids.push(stored.id);
                }
                ids
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    let unique: HashSet<RecordId> = all.iter().copied().collect();
    assert_eq!(unique.len(), TASKS * PER_TASK);
    assert_eq!(all.iter().max(), Some(&RecordId::new((TASKS * PER_TASK) as u64)));

    let indexed = repo.find_ids(&Predicate::new().gte("id", 1)).await.unwrap();
    assert_eq!(indexed.len(), TASKS * PER_TASK);
    let hashes = store.keys().iter().filter(|k| k.starts_with("people:")).count();
    assert_eq!(hashes, TASKS * PER_TASK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_keep_one_entry_per_record() {
    let (store, repo) = people(RepositoryConfig::default()).await;
    for i in 0..TASKS {
        repo.insert(person(&format!("p{}", i), 1)).await.unwrap();
    }
    let repo = Arc::new(repo);

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                repo.update(
                    &Predicate::new().eq("name", format!("p{}", i)),
                    Patch::new().set("age", 2).into(),
                    UpdateOptions::default(),
                )
                .await
                .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }

    let members = index_members(&store, "people.age.index").await;
    assert_eq!(members.len(), TASKS);
    assert_eq!(
        repo.find_ids(&Predicate::new().eq("age", 2)).await.unwrap().len(),
        TASKS
    );
}

// ============================================================================
// Interleaved allocation
// ============================================================================

/// MemoryStore that hands control back to the scheduler after every
/// single-command `GET`, so a second task can run between a counter read
/// and the batch that follows it.
struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait::async_trait]
impl Store for YieldingStore {
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let lone_get = matches!(commands.as_slice(), [Command::Get { .. }]);
        let replies = self.inner.execute(commands).await?;
        if lone_get {
            tokio::task::yield_now().await;
        }
        Ok(replies)
    }
}

async fn yielding_people(config: RepositoryConfig) -> (Arc<YieldingStore>, Repository<YieldingStore>) {
    init_tracing();
    let store = Arc::new(YieldingStore {
        inner: MemoryStore::new(),
    });
    let repo = RecordDb::from_arc(Arc::clone(&store))
        .with_config(config)
        .create_repository("people", people_schema())
        .await
        .unwrap();
    (store, repo)
}

#[tokio::test(flavor = "current_thread")]
async fn read_then_increment_hands_out_duplicate_ids() {
    let (store, repo) = yielding_people(RepositoryConfig::legacy()).await;

    let (a, b) = tokio::join!(repo.insert(person("Ann", 1)), repo.insert(person("Bob", 2)));
    let (a, b) = (a.unwrap(), b.unwrap());

    // both read the counter before either batch ran
    assert_eq!(a.id, RecordId::new(1));
    assert_eq!(b.id, RecordId::new(1));
    assert_eq!(store.inner.get("people__idincr").await.unwrap().as_deref(), Some("3"));

    // one hash holds whichever batch ran last; both name entries stay indexed
    let hashes = store.inner.keys().into_iter().filter(|k| k.starts_with("people:")).count();
    assert_eq!(hashes, 1);
    let stored = repo.find_by_id(RecordId::new(1)).await.unwrap().unwrap();
    let name = stored.record.get("name").and_then(Value::as_str).unwrap().to_string();
    assert!(name == "Ann" || name == "Bob");
    assert_eq!(
        index_members(&store.inner, "people.name.index").await,
        vec!["Ann:1", "Bob:1"]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn atomic_allocation_survives_interleaving() {
    let (store, repo) = yielding_people(RepositoryConfig::default()).await;

    let (a, b) = tokio::join!(repo.insert(person("Ann", 1)), repo.insert(person("Bob", 2)));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.id, b.id);
    let hashes = store.inner.keys().into_iter().filter(|k| k.starts_with("people:")).count();
    assert_eq!(hashes, 2);
    let found = repo.find(&Predicate::new().gte("id", 1)).await.unwrap();
    let mut found = names(&found);
    found.sort();
    assert_eq!(found, vec!["Ann", "Bob"]);
}
