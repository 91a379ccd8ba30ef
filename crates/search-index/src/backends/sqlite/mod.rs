//! SQLite record store.
//!
//! Resource bodies, their archived versions and their index rows live in one
//! database, so a write of a body and its rows commits or rolls back as a
//! unit. In-memory databases are useful for tests; file databases run in WAL
//! mode.
//!
//! # Example
//!
//! ```no_run
//! use helios_search_index::backends::sqlite::SqliteBackend;
//! use helios_search_index::core::ResourceStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let body = serde_json::json!({"resourceType": "Location", "status": "active"});
//! let stored = backend.persist_new("Location", body, vec![], vec![]).await?;
//! assert_eq!(stored.version_id(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! -- Current version of every record
//! CREATE TABLE resources (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     resource_type TEXT NOT NULL,
//!     version_id INTEGER NOT NULL,
//!     data BLOB NOT NULL,  -- JSON data
//!     tags TEXT NOT NULL DEFAULT '[]',
//!     created_at TEXT NOT NULL,
//!     last_updated TEXT NOT NULL
//! );
//!
//! -- Superseded versions
//! CREATE TABLE resource_history (...);
//!
//! -- One row per extracted value, typed columns per value kind
//! CREATE TABLE search_index (...);
//! ```

mod backend;
mod schema;
mod search;
mod session;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use session::SqliteReadSession;
