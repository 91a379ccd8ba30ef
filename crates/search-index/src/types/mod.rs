//! Core types for the search index.
//!
//! - [`StoredResource`], [`ResourceId`], [`Tag`] - records kept by the store
//! - [`IndexEntry`], [`IndexRow`], [`IndexValue`] - extracted index rows
//! - [`SearchQuery`], [`QueryValue`], [`ValueKind`] - query model
//!
//! # Building a Search Query
//!
//! ```
//! use helios_search_index::types::{QueryValue, SearchQuery};
//!
//! let query = SearchQuery::new()
//!     .with("status", QueryValue::code("active"))
//!     .and(
//!         "name",
//!         [QueryValue::string("Main St Clinic"), QueryValue::string("Annex")],
//!     );
//!
//! assert_eq!(query.parameters().count(), 2);
//! ```

pub mod datetime;
mod index_row;
mod search_params;
mod stored_resource;

pub use index_row::{IndexEntry, IndexRow, IndexValue, canonicalize, column_kind_for};
pub use search_params::{QueryValue, SearchPrefix, SearchQuery, ValueKind};
pub use stored_resource::{ResourceId, StoredResource, Tag};
