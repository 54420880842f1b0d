//! Resource lifecycle state machine.
//!
//! A logical resource is either absent (never written), active, or deleted
//! (its head is a tombstone). The state is derived from the head record and
//! decides what a write does:
//!
//! | State | Create | Update | Delete |
//! |-------|--------|--------|--------|
//! | Absent | created at 1 | created at 1 if allowed, else not found | not found |
//! | Active(v) | already exists | updated at v+1 | tombstone at v+1 |
//! | Deleted(v) | resurrected at v+1 | resurrected at v+1 | no-op |
//!
//! Resurrection is reported as a creation even though the version counter
//! keeps counting from the tombstone.

use std::sync::Arc;

use crate::error::{ResourceError, StorageResult};
use crate::types::{ResourceKey, VersionRecord};

/// Lifecycle state of a logical resource, derived from its head.
#[derive(Debug, Clone)]
pub enum LifecycleState {
    /// No version has ever been written.
    Absent,
    /// The head is a live version.
    Active(Arc<VersionRecord>),
    /// The head is a tombstone.
    Deleted(Arc<VersionRecord>),
}

/// A requested change to a logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Plain create with a known id.
    Create,
    /// Update, optionally allowed to create a missing resource.
    Update {
        /// Whether an absent resource may be created.
        allow_create: bool,
    },
    /// Delete.
    Delete,
}

/// What a committed write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// First version of a new logical resource.
    Created,
    /// Live version appended after a tombstone.
    Resurrected,
    /// Live version appended after a live version.
    Updated,
    /// Tombstone appended after a live version.
    Deleted,
}

impl WriteKind {
    /// Returns true if the write should be reported as a creation.
    pub fn is_created(&self) -> bool {
        matches!(self, WriteKind::Created | WriteKind::Resurrected)
    }
}

/// The lifecycle decision for a transition.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Append one version.
    Append {
        /// What the append means.
        kind: WriteKind,
        /// Whether the new version is a tombstone.
        tombstone: bool,
    },
    /// Delete of an already deleted resource; nothing to write.
    AlreadyDeleted(Arc<VersionRecord>),
}

impl LifecycleState {
    /// Derives the state from the current head.
    pub fn from_head(head: Option<Arc<VersionRecord>>) -> Self {
        match head {
            None => LifecycleState::Absent,
            Some(record) if record.is_deleted() => LifecycleState::Deleted(record),
            Some(record) => LifecycleState::Active(record),
        }
    }

    /// Returns the head record, if any.
    pub fn head(&self) -> Option<&Arc<VersionRecord>> {
        match self {
            LifecycleState::Absent => None,
            LifecycleState::Active(record) | LifecycleState::Deleted(record) => Some(record),
        }
    }

    /// Returns the head version number, if any.
    pub fn version_id(&self) -> Option<u64> {
        self.head().map(|record| record.version_id())
    }

    /// Returns true if the head is a live version.
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Active(_))
    }

    /// Plans `transition` from this state.
    ///
    /// # Errors
    ///
    /// * `ResourceError::AlreadyExists` - create against an active resource
    /// * `ResourceError::NotFound` - delete, or update without create, of an absent resource
    pub fn plan(&self, key: &ResourceKey, transition: Transition) -> StorageResult<Plan> {
        let plan = match (self, transition) {
            (LifecycleState::Absent, Transition::Create)
            | (LifecycleState::Absent, Transition::Update { allow_create: true }) => Plan::Append {
                kind: WriteKind::Created,
                tombstone: false,
            },
            (LifecycleState::Absent, Transition::Update { allow_create: false })
            | (LifecycleState::Absent, Transition::Delete) => {
                return Err(ResourceError::NotFound {
                    resource_type: key.resource_type().to_string(),
                    id: key.id().to_string(),
                }
                .into());
            }
            (LifecycleState::Active(_), Transition::Create) => {
                return Err(ResourceError::AlreadyExists {
                    resource_type: key.resource_type().to_string(),
                    id: key.id().to_string(),
                }
                .into());
            }
            (LifecycleState::Active(_), Transition::Update { .. }) => Plan::Append {
                kind: WriteKind::Updated,
                tombstone: false,
            },
            (LifecycleState::Active(_), Transition::Delete) => Plan::Append {
                kind: WriteKind::Deleted,
                tombstone: true,
            },
            (LifecycleState::Deleted(_), Transition::Create)
            | (LifecycleState::Deleted(_), Transition::Update { .. }) => Plan::Append {
                kind: WriteKind::Resurrected,
                tombstone: false,
            },
            (LifecycleState::Deleted(record), Transition::Delete) => {
                Plan::AlreadyDeleted(record.clone())
            }
        };

        Ok(plan)
    }
}
