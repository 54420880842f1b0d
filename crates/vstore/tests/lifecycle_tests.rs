//! Lifecycle and precondition tests run against every backend.
//!
//! Each scenario is a generic function over [`VersionStore`]; the
//! `backend_tests!` macro instantiates it once per backend.

use chrono::Duration;
use serde_json::json;

use helios_vstore::VersionStore;
use helios_vstore::backends::memory::InMemoryStore;
use helios_vstore::error::{ResourceError, StorageError};
use helios_vstore::precondition::{ConditionalRequest, IfMatch, format_http_date};
use helios_vstore::repository::{
    DeleteOutcome, ReadOutcome, ResourceRepository, UpdateOptions, WriteOutcome,
};
use helios_vstore::types::HistoryParams;

#[cfg(feature = "sqlite")]
use helios_vstore::backends::sqlite::SqliteStore;

// ============================================================================
// Helper Functions
// ============================================================================

fn memory_repo() -> ResourceRepository<InMemoryStore> {
    ResourceRepository::new(InMemoryStore::new())
}

#[cfg(feature = "sqlite")]
fn sqlite_repo() -> ResourceRepository<SqliteStore> {
    let store = SqliteStore::in_memory().expect("Failed to create SQLite store");
    store.init_schema().expect("Failed to initialize schema");
    ResourceRepository::new(store)
}

fn create_patient_json(name: &str) -> serde_json::Value {
    json!({
        "resourceType": "Patient",
        "name": [{"family": name}],
        "active": true
    })
}

// ============================================================================
// Scenarios
// ============================================================================

async fn example_scenario<S: VersionStore>(repo: ResourceRepository<S>) {
    let created = repo
        .create("Patient", Some("P1"), create_patient_json("One"))
        .await
        .unwrap();
    assert!(created.is_created());
    assert_eq!(created.record().etag(), "W/\"1\"");

    let stale = repo
        .update(
            "Patient",
            "P1",
            create_patient_json("Stale"),
            UpdateOptions::default().expecting(IfMatch::Version(0)),
        )
        .await;
    assert!(stale.unwrap_err().is_conflict());

    let updated = repo
        .update(
            "Patient",
            "P1",
            create_patient_json("Two"),
            UpdateOptions::default().expecting(IfMatch::Version(1)),
        )
        .await
        .unwrap();
    assert_eq!(updated.record().etag(), "W/\"2\"");

    let current = ConditionalRequest::new().with_if_none_match("W/\"2\"");
    assert!(matches!(
        repo.read_conditional("Patient", "P1", &current).await.unwrap(),
        ReadOutcome::NotModified(_)
    ));

    let old = ConditionalRequest::new().with_if_none_match("W/\"1\"");
    match repo.read_conditional("Patient", "P1", &old).await.unwrap() {
        ReadOutcome::Found(record) => {
            assert_eq!(record.etag(), "W/\"2\"");
            assert_eq!(record.payload()["name"][0]["family"], "Two");
        }
        other => panic!("expected full read, got {:?}", other),
    }
}

async fn monotonic_etags<S: VersionStore>(repo: ResourceRepository<S>) {
    let mut previous = 0;
    for n in 0..6 {
        let outcome = repo
            .update("Patient", "p1", json!({"n": n}), UpdateOptions::upsert())
            .await
            .unwrap();
        let version = outcome.record().entity_tag().version_id();
        assert!(version > previous);
        previous = version;
    }
}

async fn idempotent_conditional_create<S: VersionStore>(repo: ResourceRepository<S>) {
    let options = || UpdateOptions::default().with_if_none_match("*");

    let first = repo
        .update("Patient", "p1", create_patient_json("A"), options())
        .await
        .unwrap();
    assert!(first.is_created());

    for _ in 0..3 {
        let again = repo
            .update("Patient", "p1", create_patient_json("B"), options())
            .await
            .unwrap();
        assert!(again.is_unchanged());
        assert_eq!(again.record().etag(), first.record().etag());
    }

    let history = repo
        .history("Patient", "p1", &HistoryParams::new())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].payload()["name"][0]["family"], "A");
}

async fn delete_then_recreate<S: VersionStore>(repo: ResourceRepository<S>) {
    repo.create("Patient", Some("p1"), create_patient_json("A"))
        .await
        .unwrap();
    let deleted = repo.delete("Patient", "p1", None).await.unwrap();
    assert!(matches!(deleted, DeleteOutcome::Deleted(_)));
    assert_eq!(deleted.record().version_id(), 2);

    assert!(matches!(
        repo.read("Patient", "p1").await,
        Err(StorageError::Resource(ResourceError::Gone { .. }))
    ));

    let recreated = repo
        .update(
            "Patient",
            "p1",
            create_patient_json("B"),
            UpdateOptions::default().with_if_none_match("*"),
        )
        .await
        .unwrap();
    match recreated {
        WriteOutcome::Committed { record, .. } => assert_eq!(record.version_id(), 3),
        other => panic!("expected commit, got {:?}", other),
    }
    assert!(repo.read("Patient", "p1").await.is_ok());
}

async fn delete_is_idempotent<S: VersionStore>(repo: ResourceRepository<S>) {
    assert!(matches!(
        repo.delete("Patient", "missing", None).await,
        Err(StorageError::Resource(ResourceError::NotFound { .. }))
    ));

    repo.create("Patient", Some("p1"), json!({})).await.unwrap();
    repo.delete("Patient", "p1", None).await.unwrap();
    let again = repo.delete("Patient", "p1", None).await.unwrap();

    assert!(matches!(again, DeleteOutcome::AlreadyDeleted(_)));
    assert_eq!(again.record().version_id(), 2);
}

async fn vread_and_history<S: VersionStore>(repo: ResourceRepository<S>) {
    repo.create("Patient", Some("p1"), create_patient_json("A"))
        .await
        .unwrap();
    repo.update("Patient", "p1", create_patient_json("B"), UpdateOptions::default())
        .await
        .unwrap();
    repo.delete("Patient", "p1", None).await.unwrap();

    let v1 = repo.vread("Patient", "p1", 1).await.unwrap();
    assert_eq!(v1.payload()["name"][0]["family"], "A");

    assert!(matches!(
        repo.vread("Patient", "p1", 3).await,
        Err(StorageError::Resource(ResourceError::Gone { .. }))
    ));
    assert!(matches!(
        repo.vread("Patient", "p1", 9).await,
        Err(StorageError::Resource(ResourceError::VersionNotFound { .. }))
    ));
    assert!(matches!(
        repo.vread("Patient", "missing", 1).await,
        Err(StorageError::Resource(ResourceError::NotFound { .. }))
    ));

    let history = repo
        .history("Patient", "p1", &HistoryParams::new())
        .await
        .unwrap();
    let versions: Vec<u64> = history.iter().map(|r| r.version_id()).collect();
    assert_eq!(versions, vec![3, 2, 1]);
    assert!(history[0].is_deleted());

    let limited = repo
        .history("Patient", "p1", &HistoryParams::new().count(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    let future = history[0].last_modified() + Duration::seconds(60);
    let empty = repo
        .history("Patient", "p1", &HistoryParams::new().since(future))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

async fn update_without_create<S: VersionStore>(repo: ResourceRepository<S>) {
    let result = repo
        .update("Patient", "p1", json!({}), UpdateOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(StorageError::Resource(ResourceError::NotFound { .. }))
    ));
    assert_eq!(repo.store().resource_count().await.unwrap(), 0);
}

async fn if_modified_since_read<S: VersionStore>(repo: ResourceRepository<S>) {
    let created = repo.create("Patient", Some("p1"), json!({})).await.unwrap();
    let last_modified = format_http_date(&created.record().last_modified());

    let unchanged = ConditionalRequest::new().with_if_modified_since(last_modified.clone());
    assert!(matches!(
        repo.read_conditional("Patient", "p1", &unchanged).await.unwrap(),
        ReadOutcome::NotModified(_)
    ));

    let truncated = ConditionalRequest::new().with_if_modified_since("Tue");
    assert!(matches!(
        repo.read_conditional("Patient", "p1", &truncated).await.unwrap(),
        ReadOutcome::Found(_)
    ));

    let conflicting = ConditionalRequest::new()
        .with_if_modified_since(last_modified)
        .with_if_modified_since("Sun, 06 Nov 1994 08:49:37 GMT");
    assert!(matches!(
        repo.read_conditional("Patient", "p1", &conflicting).await.unwrap(),
        ReadOutcome::Found(_)
    ));
}

async fn client_id_collision<S: VersionStore>(repo: ResourceRepository<S>) {
    repo.create("Patient", Some("p1"), json!({})).await.unwrap();
    assert!(matches!(
        repo.create("Patient", Some("p1"), json!({})).await,
        Err(StorageError::Resource(ResourceError::AlreadyExists { .. }))
    ));

    let generated = repo.create("Patient", None, json!({})).await.unwrap();
    assert!(uuid_like(generated.record().id()));
}

fn uuid_like(id: &str) -> bool {
    id.len() == 36 && id.chars().filter(|c| *c == '-').count() == 4
}

// ============================================================================
// Backend Instantiation
// ============================================================================

macro_rules! backend_tests {
    ($backend:ident, $factory:expr) => {
        mod $backend {
            use super::*;

            #[tokio::test]
            async fn test_example_scenario() {
                example_scenario($factory).await;
            }

            #[tokio::test]
            async fn test_monotonic_etags() {
                monotonic_etags($factory).await;
            }

            #[tokio::test]
            async fn test_idempotent_conditional_create() {
                idempotent_conditional_create($factory).await;
            }

            #[tokio::test]
            async fn test_delete_then_recreate() {
                delete_then_recreate($factory).await;
            }

            #[tokio::test]
            async fn test_delete_is_idempotent() {
                delete_is_idempotent($factory).await;
            }

            #[tokio::test]
            async fn test_vread_and_history() {
                vread_and_history($factory).await;
            }

            #[tokio::test]
            async fn test_update_without_create() {
                update_without_create($factory).await;
            }

            #[tokio::test]
            async fn test_if_modified_since_read() {
                if_modified_since_read($factory).await;
            }

            #[tokio::test]
            async fn test_client_id_collision() {
                client_id_collision($factory).await;
            }
        }
    };
}

backend_tests!(memory, memory_repo());

#[cfg(feature = "sqlite")]
backend_tests!(sqlite, sqlite_repo());
