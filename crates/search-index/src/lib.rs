//! Helios Search Index
//!
//! This crate turns clinical resources into typed index rows and answers
//! AND-of-OR searches over those rows. Search parameters are declared per
//! resource type in a schema registry; each declaration names a value kind
//! and a path into the resource.
//!
//! # Features
//!
//! - **Extraction**: token, string, number/quantity, date and reference rows
//!   from declared paths, including multi-type (`value[x]`) elements
//! - **Reference resolution**: references are resolved to stored target ids
//!   at write time
//! - **Predicate composition**: comma-separated values OR, repeated
//!   parameters AND, with early exit on an empty intersection
//! - **Versioning**: updates archive the prior body and replace every row
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite record store with in-memory and file modes
//!
//! # Architecture
//!
//! - [`schema`] - Resource schemas, search parameter definitions and the path evaluator
//! - [`search`] - Extractors, reference resolution, predicates and the search coordinator
//! - [`core`] - The record store trait
//! - [`backends`] - Record store implementations
//! - [`types`] - Stored records, index rows and query values
//! - [`dao`] - Per-resource-type create, update, read and search
//! - [`engine`] - The facade wiring everything together
//! - [`error`] - Error types for all operations
//! - [`config`] - Engine configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use helios_search_index::SearchEngine;
//! use helios_search_index::types::{QueryValue, SearchQuery};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SearchEngine::in_memory()?;
//! let observations = engine.dao("Observation")?;
//!
//! observations
//!     .create(json!({
//!         "resourceType": "Observation",
//!         "status": "final",
//!         "effectiveDateTime": "2020-01-01T00:00:00Z",
//!         "valueQuantity": {"value": 5, "unit": "mg"}
//!     }))
//!     .await?;
//!
//! // Repeated parameters are ANDed; values in one group are ORed.
//! let query = SearchQuery::new()
//!     .with("value-quantity", QueryValue::parse_number("ge5")?)
//!     .with("date", QueryValue::date_between(Some("2019-01-01"), Some("2021-01-01"))?);
//!
//! let found = observations.search(&query).await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod dao;
pub mod engine;
pub mod error;
pub mod schema;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{EngineConfig, UnknownParameterPolicy};
pub use dao::{ReindexReport, ResourceDao};
pub use engine::SearchEngine;
pub use error::{StorageError, StorageResult};
pub use types::{QueryValue, ResourceId, SearchQuery, StoredResource};

// Re-export core traits
pub use core::{ReadSession, ResourceStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
