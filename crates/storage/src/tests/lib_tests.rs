use super::*;

async fn sorted_members(store: &impl SetStore, key: &str) -> Vec<String> {
    let mut members = store.members(key).await.expect("members");
    members.sort();
    members
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("sets.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = SqliteSetStore::new(&database_url).await.expect("db");
    store.add_member("k", "v").await.expect("add");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn members_persist_across_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("sets.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = SqliteSetStore::new(&database_url).await.expect("db");
    store.add_member("k", "v1").await.expect("add");
    store.pool().close().await;

    let reopened = SqliteSetStore::new(&database_url).await.expect("reopen");
    assert_eq!(sorted_members(&reopened, "k").await, vec!["v1"]);
}

#[tokio::test]
async fn add_deduplicates_members() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.add_member("k", "same").await.expect("add");
    store.add_member("k", "same").await.expect("add again");
    store.add_member("k", "other").await.expect("add other");
    assert_eq!(sorted_members(&store, "k").await, vec!["other", "same"]);
}

#[tokio::test]
async fn missing_key_reads_as_empty_set() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    assert!(store.members("nothing").await.expect("members").is_empty());
    store.delete_key("nothing").await.expect("delete missing");
}

#[tokio::test]
async fn move_member_relocates_single_value() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.add_member("from", "a").await.expect("add");
    store.add_member("from", "b").await.expect("add");
    store.add_member("to", "c").await.expect("add");

    assert!(store.move_member("from", "to", "a").await.expect("move"));
    assert_eq!(sorted_members(&store, "from").await, vec!["b"]);
    assert_eq!(sorted_members(&store, "to").await, vec!["a", "c"]);

    assert!(!store.move_member("from", "to", "a").await.expect("second move"));
    assert!(!store.move_member("absent", "to", "b").await.expect("absent source"));
}

#[tokio::test]
async fn move_member_into_set_already_holding_value() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.add_member("from", "a").await.expect("add");
    store.add_member("to", "a").await.expect("add");

    assert!(store.move_member("from", "to", "a").await.expect("move"));
    assert!(store.members("from").await.expect("from").is_empty());
    assert_eq!(sorted_members(&store, "to").await, vec!["a"]);
}

#[tokio::test]
async fn union_into_accumulates_and_keeps_sources() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.add_member("dest", "d").await.expect("add");
    store.add_member("s1", "a").await.expect("add");
    store.add_member("s2", "b").await.expect("add");
    store.add_member("s2", "a").await.expect("add");

    store
        .union_into("dest", &["s1".to_string(), "s2".to_string(), "missing".to_string()])
        .await
        .expect("union");

    assert_eq!(sorted_members(&store, "dest").await, vec!["a", "b", "d"]);
    assert_eq!(sorted_members(&store, "s1").await, vec!["a"]);
    assert_eq!(sorted_members(&store, "s2").await, vec!["a", "b"]);
}

#[tokio::test]
async fn delete_key_only_touches_that_set() {
    let store = SqliteSetStore::new("sqlite::memory:").await.expect("db");
    store.add_member("k1", "a").await.expect("add");
    store.add_member("k2", "a").await.expect("add");

    store.delete_key("k1").await.expect("delete");
    store.delete_key("k1").await.expect("delete twice");

    assert!(store.members("k1").await.expect("k1").is_empty());
    assert_eq!(sorted_members(&store, "k2").await, vec!["a"]);
}

#[tokio::test]
async fn shared_store_behind_arc_is_a_store() {
    let store: Arc<dyn SetStore> = Arc::new(MemoryStore::new());
    store.add_member("k", "v").await.expect("add");
    assert_eq!(sorted_members(&store, "k").await, vec!["v"]);
}

#[test]
fn sqlite_path_skips_memory_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("sqlite://file:sets?mode=memory&cache=shared"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/sets.db?mode=rwc"),
        Some(PathBuf::from("./data/sets.db"))
    );
}
