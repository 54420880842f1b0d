//! Storage abstractions.
//!
//! Backends implement [`VersionStore`]; everything above it (precondition
//! evaluation, locking, lifecycle rules) is backend independent.

mod store;

pub use store::{NewVersion, VersionStore};
