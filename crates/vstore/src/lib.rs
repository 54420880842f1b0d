//! Helios Versioned Resource Store
//!
//! This crate keeps every version of every resource and arbitrates concurrent
//! writers so that each logical resource has exactly one linear history.
//!
//! # Features
//!
//! - **Append-only history**: each write appends an immutable, numbered version
//! - **Optimistic concurrency**: writes can name the version they expect to replace
//! - **Per-resource write serialization**: FIFO locking, no cross-resource contention
//! - **Soft delete**: deletion appends a tombstone; a later write resurrects the resource
//! - **HTTP preconditions**: `If-None-Match`, `If-Modified-Since` and `If-Match` evaluation
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! The in-memory backend is always available.
//!
//! # Architecture
//!
//! - [`types`] - Version records, resource keys and entity tags
//! - [`error`] - Error types for all operations
//! - [`core`] - The [`VersionStore`](core::VersionStore) trait
//! - [`backends`] - Backend implementations (memory, SQLite)
//! - [`precondition`] - Pure HTTP precondition evaluation
//! - [`lifecycle`] - Absent / active / deleted state machine
//! - [`resolver`] - Per-identifier locking and expected-version checks
//! - [`repository`] - The [`ResourceRepository`] tying it all together
//!
//! # Quick Start
//!
//! ```
//! use helios_vstore::backends::memory::InMemoryStore;
//! use helios_vstore::precondition::IfMatch;
//! use helios_vstore::repository::{ResourceRepository, UpdateOptions};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let repo = ResourceRepository::new(InMemoryStore::new());
//!
//! let created = repo
//!     .create("Patient", Some("p1"), json!({"active": true}))
//!     .await
//!     .unwrap();
//! assert_eq!(created.record().version_id(), 1);
//! assert_eq!(created.record().etag(), "W/\"1\"");
//!
//! // A writer that read version 1 may replace it...
//! let updated = repo
//!     .update(
//!         "Patient",
//!         "p1",
//!         json!({"active": false}),
//!         UpdateOptions::default().expecting(IfMatch::Version(1)),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(updated.record().version_id(), 2);
//!
//! // ...but a second writer holding the same stale version conflicts.
//! let stale = repo
//!     .update(
//!         "Patient",
//!         "p1",
//!         json!({}),
//!         UpdateOptions::default().expecting(IfMatch::Version(1)),
//!     )
//!     .await;
//! assert!(stale.unwrap_err().is_conflict());
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod lifecycle;
pub mod precondition;
pub mod repository;
pub mod resolver;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{EntityTag, HistoryParams, ResourceKey, ResourceMethod, VersionRecord};

pub use core::{NewVersion, VersionStore};
pub use precondition::{ConditionalRequest, IfMatch, Precondition};
pub use repository::{
    DeleteOutcome, ReadOutcome, ResourceRepository, UpdateOptions, WriteOutcome,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
