//! SQLite file database tests.

#![cfg(feature = "sqlite")]

use serde_json::json;

use helios_vstore::VersionStore;
use helios_vstore::backends::sqlite::{SqliteStore, SqliteStoreConfig};
use helios_vstore::repository::{ResourceRepository, UpdateOptions};
use helios_vstore::types::HistoryParams;

fn open_store(path: &std::path::Path) -> SqliteStore {
    let store = SqliteStore::open(path).expect("Failed to open SQLite store");
    store.init_schema().expect("Failed to initialize schema");
    store
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vstore.db");

    {
        let repo = ResourceRepository::new(open_store(&path));
        repo.create("Patient", Some("p1"), json!({"n": 1})).await.unwrap();
        repo.update("Patient", "p1", json!({"n": 2}), UpdateOptions::default())
            .await
            .unwrap();
        repo.delete("Patient", "p1", None).await.unwrap();
    }

    let repo = ResourceRepository::new(open_store(&path));
    assert!(!repo.store().is_memory());
    assert_eq!(repo.store().resource_count().await.unwrap(), 1);

    let history = repo
        .history("Patient", "p1", &HistoryParams::new())
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].is_deleted());
    assert_eq!(history[2].payload(), &json!({"n": 1}));

    // Writing after reopen continues the chain.
    let resurrected = repo
        .update("Patient", "p1", json!({"n": 4}), UpdateOptions::default())
        .await
        .unwrap();
    assert!(resurrected.is_created());
    assert_eq!(resurrected.record().version_id(), 4);
}

#[tokio::test]
async fn test_last_modified_round_trips_with_precision() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("vstore.db"));
    let repo = ResourceRepository::new(store);

    let created = repo.create("Patient", Some("p1"), json!({})).await.unwrap();
    let read = repo.read("Patient", "p1").await.unwrap();

    assert_eq!(read.last_modified(), created.record().last_modified());
}

#[test]
fn test_config_defaults_from_empty_json() {
    let config: SqliteStoreConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.busy_timeout_ms, 5000);
    assert!(config.enable_wal);
}

#[test]
fn test_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig {
        max_connections: 2,
        ..Default::default()
    };
    let store = SqliteStore::with_config(dir.path().join("vstore.db"), config).unwrap();
    store.init_schema().unwrap();
    assert_eq!(store.config().max_connections, 2);
}
