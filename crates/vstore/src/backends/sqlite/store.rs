//! [`VersionStore`] implementation for SQLite.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use serde_json::Value;

use crate::core::{NewVersion, VersionStore};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{HistoryParams, ResourceKey, ResourceMethod, VersionRecord, next_last_modified};

use super::SqliteStore;

const SELECT_COLUMNS: &str =
    "SELECT version_id, last_modified, deleted, method, data FROM resource_versions";

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn format_timestamp(instant: &DateTime<Utc>) -> String {
    // Fixed-width nanosecond precision keeps text ordering equal to time ordering.
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("Invalid last_modified: {}", e)))
}

/// Raw column values of one row, decoded outside the rusqlite callback.
struct VersionRow {
    version_id: i64,
    last_modified: String,
    deleted: bool,
    method: String,
    data: String,
}

impl VersionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            version_id: row.get(0)?,
            last_modified: row.get(1)?,
            deleted: row.get::<_, i64>(2)? != 0,
            method: row.get(3)?,
            data: row.get(4)?,
        })
    }

    fn into_record(self, key: &ResourceKey) -> StorageResult<VersionRecord> {
        let version_id = u64::try_from(self.version_id)
            .map_err(|_| serialization_error(format!("Invalid version_id: {}", self.version_id)))?;
        let last_modified = parse_timestamp(&self.last_modified)?;

        if self.deleted {
            return Ok(VersionRecord::tombstone(key.clone(), version_id, last_modified));
        }

        let method: ResourceMethod = self.method.parse().map_err(serialization_error)?;
        let payload: Value = serde_json::from_str(&self.data)?;
        Ok(VersionRecord::new(
            key.clone(),
            version_id,
            last_modified,
            payload,
            method,
        ))
    }
}

#[async_trait]
impl VersionStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn append(
        &self,
        key: &ResourceKey,
        version: NewVersion,
    ) -> StorageResult<Arc<VersionRecord>> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = tx
            .query_row(
                &format!(
                    "{} WHERE resource_type = ?1 AND id = ?2 ORDER BY version_id DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![key.resource_type(), key.id()],
                VersionRow::from_row,
            )
            .optional()?
            .map(|row| row.into_record(key))
            .transpose()?;

        let version_id = previous.as_ref().map_or(1, |prev| prev.version_id() + 1);
        let last_modified = next_last_modified(previous.as_ref());
        let record = version.into_record(key.clone(), version_id, last_modified);

        let data = serde_json::to_string(record.payload())?;
        let stored_version = i64::try_from(version_id)
            .map_err(|_| serialization_error(format!("version_id overflow: {}", version_id)))?;

        tx.execute(
            "INSERT INTO resource_versions
                (resource_type, id, version_id, last_modified, deleted, method, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key.resource_type(),
                key.id(),
                stored_version,
                format_timestamp(&record.last_modified()),
                record.is_deleted() as i64,
                record.method().as_str(),
                data,
            ],
        )?;
        tx.commit()?;

        Ok(Arc::new(record))
    }

    async fn head(&self, key: &ResourceKey) -> StorageResult<Option<Arc<VersionRecord>>> {
        let conn = self.get_connection()?;
        let row = conn
            .query_row(
                &format!(
                    "{} WHERE resource_type = ?1 AND id = ?2 ORDER BY version_id DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![key.resource_type(), key.id()],
                VersionRow::from_row,
            )
            .optional()?;

        row.map(|row| row.into_record(key).map(Arc::new)).transpose()
    }

    async fn history(
        &self,
        key: &ResourceKey,
        params: &HistoryParams,
    ) -> StorageResult<Vec<Arc<VersionRecord>>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE resource_type = ?1 AND id = ?2 ORDER BY version_id DESC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![key.resource_type(), key.id()], VersionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::new();
        for row in rows {
            let record = row.into_record(key)?;
            if !params.includes(&record) {
                continue;
            }
            records.push(Arc::new(record));
            if params.count.is_some_and(|count| records.len() >= count) {
                break;
            }
        }

        Ok(records)
    }

    async fn at(
        &self,
        key: &ResourceKey,
        version_id: u64,
    ) -> StorageResult<Option<Arc<VersionRecord>>> {
        let Ok(stored_version) = i64::try_from(version_id) else {
            return Ok(None);
        };

        let conn = self.get_connection()?;
        let row = conn
            .query_row(
                &format!(
                    "{} WHERE resource_type = ?1 AND id = ?2 AND version_id = ?3",
                    SELECT_COLUMNS
                ),
                params![key.resource_type(), key.id(), stored_version],
                VersionRow::from_row,
            )
            .optional()?;

        row.map(|row| row.into_record(key).map(Arc::new)).transpose()
    }

    async fn resource_count(&self) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT resource_type, id FROM resource_versions)",
            [],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    fn key() -> ResourceKey {
        ResourceKey::new("Patient", "p1")
    }

    #[tokio::test]
    async fn test_append_and_head() {
        let store = create_test_store();

        let v1 = store
            .append(&key(), NewVersion::content(json!({"active": true}), ResourceMethod::Post))
            .await
            .unwrap();
        assert_eq!(v1.version_id(), 1);
        assert_eq!(v1.method(), ResourceMethod::Post);

        let v2 = store
            .append(&key(), NewVersion::content(json!({"active": false}), ResourceMethod::Put))
            .await
            .unwrap();
        assert_eq!(v2.version_id(), 2);
        assert!(v2.last_modified() >= v1.last_modified());

        let head = store.head(&key()).await.unwrap().unwrap();
        assert_eq!(head.version_id(), 2);
        assert_eq!(head.payload(), &json!({"active": false}));
        assert_eq!(head.last_modified(), v2.last_modified());
    }

    #[tokio::test]
    async fn test_tombstone_round_trips() {
        let store = create_test_store();
        store
            .append(&key(), NewVersion::content(json!({}), ResourceMethod::Post))
            .await
            .unwrap();
        store.append(&key(), NewVersion::tombstone()).await.unwrap();

        let head = store.head(&key()).await.unwrap().unwrap();
        assert!(head.is_deleted());
        assert_eq!(head.version_id(), 2);
        assert_eq!(head.method(), ResourceMethod::Delete);
        assert!(head.payload().is_null());
    }

    #[tokio::test]
    async fn test_history_newest_first_with_count() {
        let store = create_test_store();
        for n in 0..4 {
            store
                .append(&key(), NewVersion::content(json!({"n": n}), ResourceMethod::Put))
                .await
                .unwrap();
        }

        let all = store.history(&key(), &HistoryParams::new()).await.unwrap();
        let versions: Vec<u64> = all.iter().map(|r| r.version_id()).collect();
        assert_eq!(versions, vec![4, 3, 2, 1]);

        let limited = store
            .history(&key(), &HistoryParams::new().count(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].version_id(), 4);
    }

    #[tokio::test]
    async fn test_at_and_unknown() {
        let store = create_test_store();
        store
            .append(&key(), NewVersion::content(json!({"v": 1}), ResourceMethod::Post))
            .await
            .unwrap();

        assert_eq!(store.at(&key(), 1).await.unwrap().unwrap().payload()["v"], 1);
        assert!(store.at(&key(), 2).await.unwrap().is_none());
        assert!(store.at(&key(), u64::MAX).await.unwrap().is_none());

        let other = ResourceKey::new("Patient", "other");
        assert!(store.head(&other).await.unwrap().is_none());
        assert!(store.history(&other, &HistoryParams::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resource_count() {
        let store = create_test_store();
        assert_eq!(store.resource_count().await.unwrap(), 0);

        for id in ["a", "b"] {
            let key = ResourceKey::new("Patient", id);
            store
                .append(&key, NewVersion::content(json!({}), ResourceMethod::Post))
                .await
                .unwrap();
            store
                .append(&key, NewVersion::content(json!({}), ResourceMethod::Put))
                .await
                .unwrap();
        }

        assert_eq!(store.resource_count().await.unwrap(), 2);
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = format_timestamp(&"2024-01-01T00:00:00Z".parse().unwrap());
        let b = format_timestamp(&"2024-01-01T00:00:00.5Z".parse().unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap().timestamp_subsec_millis(), 500);
    }
}
