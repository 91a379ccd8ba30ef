//! Record store traits.
//!
//! [`ResourceStore`] persists resource bodies together with their index rows
//! and answers the predicate queries issued during a search. A search runs
//! inside a [`ReadSession`] so that every narrowing query and the final load
//! observe the same snapshot.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::search::{CandidateSet, IndexPredicate};
use crate::types::{IndexEntry, IndexRow, ResourceId, StoredResource, Tag};

/// Durable storage for resource records and their index rows.
///
/// Every mutating operation writes the body and the full set of index rows
/// in one atomic unit: a failure leaves neither the body nor any row behind.
///
/// # Example
///
/// ```ignore
/// use helios_search_index::core::ResourceStore;
///
/// async fn show<S: ResourceStore>(store: &S) -> helios_search_index::error::StorageResult<()> {
///     let body = serde_json::json!({"resourceType": "Location", "status": "active"});
///     let stored = store.persist_new("Location", body, vec![], vec![]).await?;
///     let read = store.find_by_id("Location", stored.id()).await?;
///     assert_eq!(read.version_id(), 1);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Assigns a new id and persists the body and its index rows.
    async fn persist_new(
        &self,
        resource_type: &str,
        content: Value,
        tags: Vec<Tag>,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<StoredResource>;

    /// Archives the current version, overwrites the body, bumps the version
    /// and replaces every index row of the record.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If no record has this id
    async fn replace(
        &self,
        resource_type: &str,
        id: ResourceId,
        content: Value,
        tags: Vec<Tag>,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<StoredResource>;

    /// Reads the current version of a record.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - If no record has this id
    async fn find_by_id(&self, resource_type: &str, id: ResourceId)
    -> StorageResult<StoredResource>;

    /// Returns the current version followed by archived versions, newest first.
    async fn history(&self, resource_type: &str, id: ResourceId)
    -> StorageResult<Vec<StoredResource>>;

    /// Returns the stored index rows of a record, ordered by parameter name
    /// and value.
    async fn index_rows(&self, resource_type: &str, id: ResourceId)
    -> StorageResult<Vec<IndexRow>>;

    /// Returns the ids of every record of a type, ascending.
    async fn list_ids(&self, resource_type: &str) -> StorageResult<Vec<ResourceId>>;

    /// Replaces the index rows of a record without touching its body.
    async fn replace_index(
        &self,
        resource_type: &str,
        id: ResourceId,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<()>;

    /// Opens a read session scoped to one resource type.
    async fn begin_read(&self, resource_type: &str) -> StorageResult<Box<dyn ReadSession>>;
}

/// A read unit of work grouping predicate queries and the final load.
///
/// Dropping a session without calling [`finish`](ReadSession::finish)
/// releases it without error reporting.
#[async_trait]
pub trait ReadSession: Send {
    /// Returns the ids of records owning at least one row that satisfies the
    /// predicate.
    async fn query_ids(&mut self, predicate: &IndexPredicate) -> StorageResult<BTreeSet<ResourceId>>;

    /// Loads the records in the candidate set, ordered by id ascending.
    ///
    /// An unconstrained set loads every record of the session's type.
    async fn load(&mut self, candidates: &CandidateSet) -> StorageResult<Vec<StoredResource>>;

    /// Ends the session.
    async fn finish(self: Box<Self>) -> StorageResult<()>;
}
