//! SQLite version store.
//!
//! Stores every version of every resource in a single append-only table.
//! Supports in-memory databases (tests) and file databases (small
//! deployments).
//!
//! # Example
//!
//! ```no_run
//! use helios_vstore::backends::sqlite::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("./data/vstore.db")?;
//! store.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE resource_versions (
//!     resource_type TEXT NOT NULL,
//!     id TEXT NOT NULL,
//!     version_id INTEGER NOT NULL,
//!     last_modified TEXT NOT NULL,  -- RFC 3339, nanosecond precision
//!     deleted INTEGER NOT NULL DEFAULT 0,
//!     method TEXT NOT NULL,
//!     data TEXT NOT NULL,           -- JSON
//!     PRIMARY KEY (resource_type, id, version_id)
//! );
//! ```
//!
//! The primary key makes a duplicate version number a constraint violation,
//! so a broken lock discipline surfaces as an error instead of a forked chain.

mod backend;
mod schema;
mod store;

pub use backend::{SqliteStore, SqliteStoreConfig};
