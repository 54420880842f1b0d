//! Storage backend implementations.
//!
//! - [`memory`] - volatile store for tests and ephemeral servers
//! - [`sqlite`] - durable store using SQLite (requires the `sqlite` feature)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
