//! Per-identifier write serialization and conflict detection.
//!
//! Every write to a logical resource runs inside that resource's critical
//! section: lock, read head, check the caller's expected version, plan the
//! lifecycle transition, append, unlock. Writers to different identifiers
//! never share a lock.
//!
//! The per-identifier lock is a [`tokio::sync::Mutex`], which grants the lock
//! in FIFO order. Waiting writers are therefore served in arrival order and
//! none can be starved while contention is bounded. The lock table itself is
//! guarded by a short-lived `parking_lot` mutex that is never held across an
//! await point.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{ConcurrencyError, StorageResult};
use crate::lifecycle::{LifecycleState, Plan, Transition};
use crate::precondition::IfMatch;
use crate::types::ResourceKey;

/// Holds one identifier's write lock until dropped.
#[derive(Debug)]
pub struct WriteGuard {
    key: ResourceKey,
    _guard: OwnedMutexGuard<()>,
}

impl WriteGuard {
    /// Returns the key this guard locks.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }
}

/// Serializes writers per logical identifier and decides each write.
#[derive(Debug, Default)]
pub struct ConflictResolver {
    locks: Mutex<HashMap<ResourceKey, Arc<AsyncMutex<()>>>>,
}

impl ConflictResolver {
    /// Creates a resolver with an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock for `key`, waiting in FIFO order.
    ///
    /// Lock entries are kept for the life of the resolver, matching the
    /// lifetime of the logical resources they protect.
    pub async fn lock(&self, key: &ResourceKey) -> WriteGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.lock_owned().await;
        WriteGuard {
            key: key.clone(),
            _guard: guard,
        }
    }

    /// Returns the number of identifiers that have been locked at least once.
    pub fn tracked_keys(&self) -> usize {
        self.locks.lock().len()
    }

    /// Decides a write against the head read under `guard`.
    ///
    /// Checks the caller's expected version first, then plans the lifecycle
    /// transition.
    ///
    /// # Errors
    ///
    /// * `ConcurrencyError::VersionConflict` - the head is not the expected version
    /// * `ResourceError::AlreadyExists` / `ResourceError::NotFound` - from the lifecycle
    pub fn resolve(
        &self,
        guard: &WriteGuard,
        state: &LifecycleState,
        transition: Transition,
        expected: Option<IfMatch>,
    ) -> StorageResult<Plan> {
        check_expected_version(guard.key(), state, expected)?;
        state.plan(guard.key(), transition)
    }
}

/// Verifies that the head matches what a version-qualified write expects.
///
/// `IfMatch::Any` requires a live head. `IfMatch::Version(v)` requires the
/// head, live or tombstone, to be exactly version `v`.
pub fn check_expected_version(
    key: &ResourceKey,
    state: &LifecycleState,
    expected: Option<IfMatch>,
) -> StorageResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let matches = match expected {
        IfMatch::Any => state.is_active(),
        IfMatch::Version(version) => state.version_id() == Some(version),
    };

    if matches {
        return Ok(());
    }

    let actual_version = state
        .version_id()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());

    debug!(
        resource = %key,
        expected = %expected,
        actual = %actual_version,
        "Rejecting write with stale expected version"
    );

    Err(ConcurrencyError::VersionConflict {
        resource_type: key.resource_type().to_string(),
        id: key.id().to_string(),
        expected_version: expected.to_string(),
        actual_version,
    }
    .into())
}
