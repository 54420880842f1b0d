//! Version store trait.
//!
//! This module defines the [`VersionStore`] trait: a durable, append-only chain
//! of immutable [`VersionRecord`]s per logical resource.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{HistoryParams, ResourceKey, ResourceMethod, VersionRecord};

/// The content of a version about to be appended.
#[derive(Debug, Clone)]
pub struct NewVersion {
    /// Resource content. Ignored for tombstones.
    pub payload: Value,
    /// Whether the new version is a tombstone.
    pub deleted: bool,
    /// The interaction producing the version.
    pub method: ResourceMethod,
}

impl NewVersion {
    /// A live version carrying `payload`.
    pub fn content(payload: Value, method: ResourceMethod) -> Self {
        Self {
            payload,
            deleted: false,
            method,
        }
    }

    /// A tombstone version.
    pub fn tombstone() -> Self {
        Self {
            payload: Value::Null,
            deleted: true,
            method: ResourceMethod::Delete,
        }
    }

    /// Builds the record for `key` at `version_id`.
    pub fn into_record(
        self,
        key: ResourceKey,
        version_id: u64,
        last_modified: chrono::DateTime<chrono::Utc>,
    ) -> VersionRecord {
        if self.deleted {
            VersionRecord::tombstone(key, version_id, last_modified)
        } else {
            VersionRecord::new(key, version_id, last_modified, self.payload, self.method)
        }
    }
}

/// Append-only storage of version chains.
///
/// # Locking
///
/// Implementations make each `append` atomic with respect to readers, so a
/// reader sees either the old head or the new one, never a partial record.
/// They do **not** serialize appends to the same key: callers must hold that
/// key's write lock from the [`ConflictResolver`](crate::resolver::ConflictResolver)
/// for the whole read-head-then-append sequence.
///
/// # Example
///
/// ```ignore
/// use helios_vstore::core::{NewVersion, VersionStore};
/// use helios_vstore::types::{ResourceKey, ResourceMethod};
///
/// async fn example<S: VersionStore>(store: &S) -> StorageResult<()> {
///     let key = ResourceKey::new("Patient", "p1");
///     let v1 = store
///         .append(&key, NewVersion::content(json!({"active": true}), ResourceMethod::Post))
///         .await?;
///     assert_eq!(v1.version_id(), 1);
///
///     let head = store.head(&key).await?;
///     assert_eq!(head.map(|h| h.version_id()), Some(1));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Appends a new version to the chain for `key`.
    ///
    /// Allocates `versionId = head.versionId + 1` (or 1 for a new chain), stamps
    /// `lastModified` no earlier than the previous head, stores the record and
    /// advances the head.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend` - If the storage medium fails
    async fn append(&self, key: &ResourceKey, version: NewVersion)
    -> StorageResult<Arc<VersionRecord>>;

    /// Returns the latest version for `key`, tombstone or not.
    async fn head(&self, key: &ResourceKey) -> StorageResult<Option<Arc<VersionRecord>>>;

    /// Returns the versions for `key`, newest first.
    ///
    /// An unknown key yields an empty list.
    async fn history(
        &self,
        key: &ResourceKey,
        params: &HistoryParams,
    ) -> StorageResult<Vec<Arc<VersionRecord>>>;

    /// Returns one specific version of `key`.
    async fn at(
        &self,
        key: &ResourceKey,
        version_id: u64,
    ) -> StorageResult<Option<Arc<VersionRecord>>>;

    /// Returns the number of logical resources in the store.
    async fn resource_count(&self) -> StorageResult<u64>;
}
