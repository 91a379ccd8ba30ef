//! Search parameter extraction and predicate composition.
//!
//! - [`converters`] - per-kind conversion of element values into index values
//! - [`extractor`] - token, string, number/quantity and date extraction
//! - [`references`] - reference resolution through the resource handle table
//! - [`predicate`] - query values to row predicates, candidate narrowing
//! - [`coordinator`] - AND-of-OR composition over one read session
//!
//! # Write path
//!
//! ```text
//! resource ──► SearchParameterExtractor ──┐
//!          └─► ReferenceExtractor ────────┴─► canonical Vec<IndexEntry> ──► ResourceStore
//! ```
//!
//! # Read path
//!
//! ```text
//! SearchQuery ──► for each parameter, for each OR-group:
//!                     PredicateBuilder ──► ReadSession::query_ids ──► CandidateSet::narrow
//!             ──► ReadSession::load(candidates)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use helios_search_index::search::SearchParameterExtractor;
//!
//! let extractor = SearchParameterExtractor::new(registry.clone(), evaluator.clone());
//! for entry in extractor.extract(&location_json, "Location")? {
//!     println!("{}: {:?}", entry.param_name, entry.value);
//! }
//! ```

pub mod converters;
pub mod coordinator;
pub mod extractor;
pub mod predicate;
pub mod references;

pub use converters::{ValueConverter, normalize_string};
pub use coordinator::SearchCoordinator;
pub use extractor::SearchParameterExtractor;
pub use predicate::{
    CandidateSet, Comparator, IndexPredicate, PredicateBuilder, RowCondition, match_group,
};
pub use references::{HandleTable, ReferenceExtractor, ResourceHandle};
