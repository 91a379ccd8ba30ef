//! Per-resource-type access.
//!
//! A [`ResourceDao`] ties extraction to the record store for one resource
//! type: every write runs the full extraction first and hands the body and
//! its complete row set to the store in a single call, so a failed
//! extraction never reaches the store and a failed store write leaves
//! nothing behind.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::engine::EngineInner;
use crate::error::StorageResult;
use crate::search::extractor::validate_resource;
use crate::types::{
    IndexEntry, IndexRow, QueryValue, ResourceId, SearchQuery, StoredResource, Tag, canonicalize,
};

/// Outcome of [`ResourceDao::reindex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    /// The reindexed resource type.
    pub resource_type: String,
    /// Number of records re-extracted.
    pub processed: usize,
    /// Total index rows written.
    pub rows_written: usize,
}

/// Create, update, read and search for one resource type.
///
/// Obtained from [`SearchEngine::dao`](crate::engine::SearchEngine::dao).
#[derive(Clone)]
pub struct ResourceDao {
    resource_type: String,
    inner: Arc<EngineInner>,
}

impl ResourceDao {
    pub(crate) fn new(resource_type: impl Into<String>, inner: Arc<EngineInner>) -> Self {
        Self {
            resource_type: resource_type.into(),
            inner,
        }
    }

    /// The resource type served by this DAO.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Stores a new resource and its index rows.
    ///
    /// # Errors
    ///
    /// * `ResourceError::Invalid` - the body is not an object of this type
    /// * `SchemaError::KindMismatch` - a single-type path held a value of the wrong kind
    /// * `ResourceError::NotFound` - a reference names a record that does not exist
    pub async fn create(&self, content: Value) -> StorageResult<StoredResource> {
        let entries = self.extract_all(&content).await?;
        let tags = Tag::from_meta(&content);

        let stored = self
            .inner
            .store
            .persist_new(&self.resource_type, content, tags, entries)
            .await?;

        tracing::debug!(resource_type = %self.resource_type, id = %stored.id(), "created resource");
        Ok(stored)
    }

    /// Replaces a resource body, archiving the prior version and
    /// regenerating every index row.
    pub async fn update(&self, id: ResourceId, content: Value) -> StorageResult<StoredResource> {
        let entries = self.extract_all(&content).await?;
        let tags = Tag::from_meta(&content);

        self.inner
            .store
            .replace(&self.resource_type, id, content, tags, entries)
            .await
    }

    /// Reads the current version of a resource.
    pub async fn read(&self, id: ResourceId) -> StorageResult<StoredResource> {
        self.inner.store.find_by_id(&self.resource_type, id).await
    }

    /// Returns every version of a resource, newest first.
    pub async fn history(&self, id: ResourceId) -> StorageResult<Vec<StoredResource>> {
        self.inner.store.history(&self.resource_type, id).await
    }

    /// Runs a query and returns the matching records ordered by id.
    pub async fn search(&self, query: &SearchQuery) -> StorageResult<Vec<StoredResource>> {
        let session = self.inner.store.begin_read(&self.resource_type).await?;
        self.inner
            .coordinator
            .search(session, &self.resource_type, query)
            .await
    }

    /// Searches on a single parameter value.
    pub async fn search_single(
        &self,
        param_name: &str,
        value: QueryValue,
    ) -> StorageResult<Vec<StoredResource>> {
        self.search(&SearchQuery::new().with(param_name, value))
            .await
    }

    /// Computes the index entries for a body without storing anything.
    ///
    /// Reference parameters are resolved against the store, so their
    /// targets must already exist.
    pub async fn extract(&self, content: &Value) -> StorageResult<Vec<IndexEntry>> {
        self.extract_all(content).await
    }

    /// Returns the stored index rows of a resource.
    pub async fn index_rows(&self, id: ResourceId) -> StorageResult<Vec<IndexRow>> {
        self.inner.store.index_rows(&self.resource_type, id).await
    }

    /// Re-extracts every stored record of this type and replaces its rows.
    ///
    /// Records are processed one at a time; a failure stops the run and
    /// leaves already processed records reindexed.
    pub async fn reindex(&self) -> StorageResult<ReindexReport> {
        let ids = self.inner.store.list_ids(&self.resource_type).await?;

        let mut report = ReindexReport {
            resource_type: self.resource_type.clone(),
            processed: 0,
            rows_written: 0,
        };

        for id in ids {
            let stored = self.inner.store.find_by_id(&self.resource_type, id).await?;
            let entries = self.extract_all(stored.content()).await?;
            report.rows_written += entries.len();
            self.inner
                .store
                .replace_index(&self.resource_type, id, entries)
                .await?;
            report.processed += 1;
        }

        tracing::info!(
            resource_type = %report.resource_type,
            processed = report.processed,
            rows = report.rows_written,
            "reindex complete"
        );
        Ok(report)
    }

    /// References resolve before anything is written, so the store never
    /// needs a second connection while its write transaction is open.
    async fn extract_all(&self, content: &Value) -> StorageResult<Vec<IndexEntry>> {
        validate_resource(content, &self.resource_type)?;

        let mut entries = self
            .inner
            .references
            .extract(content, &self.resource_type)
            .await?;
        entries.extend(self.inner.extractor.extract(content, &self.resource_type)?);
        canonicalize(&mut entries);
        Ok(entries)
    }
}
