//! SQLite search implementation.
//!
//! - Query builder translating index predicates to SQL
//! - Parameter handlers for each value kind
//! - Index writer mapping rows onto typed columns

pub mod parameter_handlers;
pub mod query_builder;
pub mod writer;

pub use query_builder::QueryBuilder;
pub use writer::SqliteSearchIndexWriter;
