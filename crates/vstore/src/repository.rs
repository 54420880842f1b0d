//! Versioned resource repository.
//!
//! [`ResourceRepository`] is the entry point the REST layer uses. It combines a
//! [`VersionStore`] backend with the [`ConflictResolver`] and the lifecycle
//! rules, so every write follows the same sequence:
//!
//! 1. acquire the identifier's write lock
//! 2. read the head and derive its [`LifecycleState`]
//! 3. evaluate write preconditions (`If-None-Match`, expected version)
//! 4. plan the transition and append at most one version
//! 5. release the lock
//!
//! Reads take no lock. They see whichever head was last committed.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::{NewVersion, VersionStore};
use crate::error::{ResourceError, StorageResult};
use crate::lifecycle::{LifecycleState, Plan, Transition, WriteKind};
use crate::precondition::{
    ConditionalRequest, IfMatch, MatchContext, NoneMatch, Precondition, evaluate_if_none_match,
    is_wildcard,
};
use crate::resolver::ConflictResolver;
use crate::types::{HistoryParams, ResourceKey, ResourceMethod, VersionRecord};

/// Options for an update (PUT) write.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Version the caller expects to replace (`If-Match`).
    pub expected: Option<IfMatch>,

    /// Raw `If-None-Match` occurrences. `*` turns the update into a
    /// conditional create-on-update.
    pub if_none_match: Vec<String>,

    /// Whether an update may create an absent resource.
    pub allow_create: bool,
}

impl UpdateOptions {
    /// Options for an update that may create the resource.
    pub fn upsert() -> Self {
        Self {
            allow_create: true,
            ..Default::default()
        }
    }

    /// Sets the expected version.
    pub fn expecting(mut self, expected: IfMatch) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Adds an `If-None-Match` occurrence.
    pub fn with_if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match.push(value.into());
        self
    }
}

/// Result of a create or update.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// A new version was appended.
    Committed {
        /// What the append meant.
        kind: WriteKind,
        /// The new head.
        record: Arc<VersionRecord>,
    },
    /// `If-None-Match` suppressed the write; the chain is unchanged.
    Unchanged {
        /// The current head.
        record: Arc<VersionRecord>,
    },
}

impl WriteOutcome {
    /// Returns the resulting head.
    pub fn record(&self) -> &Arc<VersionRecord> {
        match self {
            WriteOutcome::Committed { record, .. } | WriteOutcome::Unchanged { record } => record,
        }
    }

    /// Returns true if the write should be reported as a creation.
    pub fn is_created(&self) -> bool {
        matches!(self, WriteOutcome::Committed { kind, .. } if kind.is_created())
    }

    /// Returns true if a precondition suppressed the write.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, WriteOutcome::Unchanged { .. })
    }
}

/// Result of a delete.
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    /// A tombstone was appended.
    Deleted(Arc<VersionRecord>),
    /// The head already was a tombstone; nothing was written.
    AlreadyDeleted(Arc<VersionRecord>),
}

impl DeleteOutcome {
    /// Returns the tombstone head.
    pub fn record(&self) -> &Arc<VersionRecord> {
        match self {
            DeleteOutcome::Deleted(record) | DeleteOutcome::AlreadyDeleted(record) => record,
        }
    }
}

/// Result of a conditional read.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// Serve the head.
    Found(Arc<VersionRecord>),
    /// The caller's copy is current.
    NotModified(Arc<VersionRecord>),
}

/// Versioned resource repository over a [`VersionStore`].
#[derive(Debug)]
pub struct ResourceRepository<S> {
    store: Arc<S>,
    resolver: ConflictResolver,
}

impl<S> ResourceRepository<S>
where
    S: VersionStore,
{
    /// Creates a repository over `store`.
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Creates a repository over a shared store.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            resolver: ConflictResolver::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Creates a resource (POST).
    ///
    /// With `id` absent a fresh UUID is assigned. With a client-supplied `id`
    /// the create fails if that resource is active, and resurrects it if its
    /// head is a tombstone.
    ///
    /// # Errors
    ///
    /// * `ResourceError::AlreadyExists` - `id` names an active resource
    pub async fn create(
        &self,
        resource_type: &str,
        id: Option<&str>,
        payload: Value,
    ) -> StorageResult<WriteOutcome> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let key = ResourceKey::new(resource_type, id);

        let guard = self.resolver.lock(&key).await;
        let state = LifecycleState::from_head(self.store.head(&key).await?);
        let plan = self
            .resolver
            .resolve(&guard, &state, Transition::Create, None)?;

        self.commit(&key, plan, payload, ResourceMethod::Post).await
    }

    /// Updates a resource (PUT).
    ///
    /// When `options.if_none_match` matches the current head (in write
    /// context) the write is suppressed and [`WriteOutcome::Unchanged`] is
    /// returned. `If-None-Match: *` always permits creating an absent
    /// resource.
    ///
    /// # Errors
    ///
    /// * `ConcurrencyError::VersionConflict` - the head is not `options.expected`
    /// * `ResourceError::NotFound` - the resource is absent and creation is not allowed
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        payload: Value,
        options: UpdateOptions,
    ) -> StorageResult<WriteOutcome> {
        let key = ResourceKey::new(resource_type, id);

        let guard = self.resolver.lock(&key).await;
        let state = LifecycleState::from_head(self.store.head(&key).await?);

        if !options.if_none_match.is_empty() {
            let decision = evaluate_if_none_match(
                &options.if_none_match,
                state.head().map(Arc::as_ref),
                MatchContext::Write,
            );
            if decision == NoneMatch::AllMatch {
                if let Some(head) = state.head() {
                    debug!(
                        resource = %key,
                        version = head.version_id(),
                        "If-None-Match suppressed write"
                    );
                    return Ok(WriteOutcome::Unchanged {
                        record: head.clone(),
                    });
                }
            }
        }

        let allow_create = options.allow_create || is_wildcard(&options.if_none_match);
        let plan = self.resolver.resolve(
            &guard,
            &state,
            Transition::Update { allow_create },
            options.expected,
        )?;

        self.commit(&key, plan, payload, ResourceMethod::Put).await
    }

    /// Deletes a resource by appending a tombstone.
    ///
    /// Deleting an already deleted resource writes nothing.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the resource never existed
    /// * `ConcurrencyError::VersionConflict` - the head is not `expected`
    pub async fn delete(
        &self,
        resource_type: &str,
        id: &str,
        expected: Option<IfMatch>,
    ) -> StorageResult<DeleteOutcome> {
        let key = ResourceKey::new(resource_type, id);

        let guard = self.resolver.lock(&key).await;
        let state = LifecycleState::from_head(self.store.head(&key).await?);
        let plan = self
            .resolver
            .resolve(&guard, &state, Transition::Delete, expected)?;

        match plan {
            Plan::AlreadyDeleted(record) => {
                debug!(resource = %key, version = record.version_id(), "Resource already deleted");
                Ok(DeleteOutcome::AlreadyDeleted(record))
            }
            Plan::Append { .. } => {
                let record = self.store.append(&key, NewVersion::tombstone()).await?;
                info!(resource = %key, version = record.version_id(), "Resource deleted");
                Ok(DeleteOutcome::Deleted(record))
            }
        }
    }

    /// Reads the current live version.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the resource never existed
    /// * `ResourceError::Gone` - the head is a tombstone
    pub async fn read(&self, resource_type: &str, id: &str) -> StorageResult<Arc<VersionRecord>> {
        let key = ResourceKey::new(resource_type, id);
        live_head(&key, self.store.head(&key).await?)
    }

    /// Reads the current live version, honoring read preconditions.
    ///
    /// The preconditions are evaluated against the head alone.
    pub async fn read_conditional(
        &self,
        resource_type: &str,
        id: &str,
        conditions: &ConditionalRequest,
    ) -> StorageResult<ReadOutcome> {
        let head = self.read(resource_type, id).await?;

        Ok(match conditions.evaluate_read(&head) {
            Precondition::NotModified => ReadOutcome::NotModified(head),
            Precondition::Proceed => ReadOutcome::Found(head),
        })
    }

    /// Reads one specific version.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the resource never existed
    /// * `ResourceError::VersionNotFound` - no such version
    /// * `ResourceError::Gone` - the version is a tombstone
    pub async fn vread(
        &self,
        resource_type: &str,
        id: &str,
        version_id: u64,
    ) -> StorageResult<Arc<VersionRecord>> {
        let key = ResourceKey::new(resource_type, id);

        match self.store.at(&key, version_id).await? {
            Some(record) if record.is_deleted() => Err(ResourceError::Gone {
                resource_type: resource_type.to_string(),
                id: id.to_string(),
                deleted_at: Some(record.last_modified()),
            }
            .into()),
            Some(record) => Ok(record),
            None => {
                if self.store.head(&key).await?.is_none() {
                    Err(not_found(&key).into())
                } else {
                    Err(ResourceError::VersionNotFound {
                        resource_type: resource_type.to_string(),
                        id: id.to_string(),
                        version_id: version_id.to_string(),
                    }
                    .into())
                }
            }
        }
    }

    /// Lists versions newest first, tombstones included.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the resource never existed
    pub async fn history(
        &self,
        resource_type: &str,
        id: &str,
        params: &HistoryParams,
    ) -> StorageResult<Vec<Arc<VersionRecord>>> {
        let key = ResourceKey::new(resource_type, id);

        if self.store.head(&key).await?.is_none() {
            return Err(not_found(&key).into());
        }

        self.store.history(&key, params).await
    }

    async fn commit(
        &self,
        key: &ResourceKey,
        plan: Plan,
        payload: Value,
        method: ResourceMethod,
    ) -> StorageResult<WriteOutcome> {
        match plan {
            Plan::Append { kind, tombstone } => {
                let version = if tombstone {
                    NewVersion::tombstone()
                } else {
                    NewVersion::content(payload, method)
                };
                let record = self.store.append(key, version).await?;

                debug!(
                    resource = %key,
                    version = record.version_id(),
                    kind = ?kind,
                    "Version committed"
                );

                Ok(WriteOutcome::Committed { kind, record })
            }
            Plan::AlreadyDeleted(record) => Ok(WriteOutcome::Unchanged { record }),
        }
    }
}

fn not_found(key: &ResourceKey) -> ResourceError {
    ResourceError::NotFound {
        resource_type: key.resource_type().to_string(),
        id: key.id().to_string(),
    }
}

fn live_head(
    key: &ResourceKey,
    head: Option<Arc<VersionRecord>>,
) -> StorageResult<Arc<VersionRecord>> {
    match LifecycleState::from_head(head) {
        LifecycleState::Active(record) => Ok(record),
        LifecycleState::Deleted(record) => Err(ResourceError::Gone {
            resource_type: key.resource_type().to_string(),
            id: key.id().to_string(),
            deleted_at: Some(record.last_modified()),
        }
        .into()),
        LifecycleState::Absent => Err(not_found(key).into()),
    }
}
