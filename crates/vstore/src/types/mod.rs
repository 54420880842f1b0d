//! Core types for the version store.
//!
//! - [`ResourceKey`] - Identity of a logical resource
//! - [`VersionRecord`] - One immutable version of a logical resource
//! - [`EntityTag`] - Weak version tag derived from a version number
//! - [`HistoryParams`] - Instance history filters

mod etag;
mod history;
mod version_record;

pub use etag::EntityTag;
pub use history::HistoryParams;
pub use version_record::{ResourceKey, ResourceMethod, VersionRecord, next_last_modified};
