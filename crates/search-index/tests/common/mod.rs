//! Test infrastructure for the search index.
//!
//! Engine constructors and resource fixtures shared by the integration
//! test binaries.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;

use helios_search_index::{EngineConfig, SearchEngine, UnknownParameterPolicy};

/// Creates an engine over a fresh in-memory database.
pub fn create_engine() -> SearchEngine {
    SearchEngine::in_memory().expect("Failed to create in-memory engine")
}

/// Creates an engine with a specific unknown-parameter policy.
pub fn create_engine_with_policy(policy: UnknownParameterPolicy) -> SearchEngine {
    let config = EngineConfig::default().with_unknown_parameters(policy);
    SearchEngine::open_sqlite(":memory:", config).expect("Failed to create in-memory engine")
}
