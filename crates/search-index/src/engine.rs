//! Engine facade.
//!
//! [`SearchEngine`] owns the shared registry, path evaluator, record store
//! and resource handle table, and hands out a [`ResourceDao`] per resource
//! type. Cloning an engine is cheap; clones share all state.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::EngineConfig;
use crate::core::ResourceStore;
use crate::dao::ResourceDao;
use crate::error::{SchemaError, StorageResult};
use crate::schema::{JsonPathEvaluator, PathEvaluator, ResourceSchema, SearchParameterRegistry};
use crate::search::{HandleTable, ReferenceExtractor, SearchCoordinator, SearchParameterExtractor};

#[cfg(feature = "sqlite")]
use std::path::Path;

#[cfg(feature = "sqlite")]
use crate::backends::sqlite::SqliteBackend;
#[cfg(feature = "sqlite")]
use crate::schema::SchemaLoader;

/// State shared by an engine and every DAO it creates.
pub(crate) struct EngineInner {
    pub(crate) registry: Arc<RwLock<SearchParameterRegistry>>,
    pub(crate) store: Arc<dyn ResourceStore>,
    pub(crate) handles: Arc<HandleTable>,
    pub(crate) extractor: SearchParameterExtractor,
    pub(crate) references: ReferenceExtractor,
    pub(crate) coordinator: SearchCoordinator,
    pub(crate) config: EngineConfig,
}

/// Search-index engine over one record store.
///
/// # Example
///
/// ```no_run
/// use helios_search_index::SearchEngine;
/// use helios_search_index::types::{QueryValue, SearchQuery};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = SearchEngine::in_memory()?;
/// let locations = engine.dao("Location")?;
///
/// locations
///     .create(json!({"resourceType": "Location", "status": "active", "name": "Main St Clinic"}))
///     .await?;
///
/// let query = SearchQuery::new()
///     .with("status", QueryValue::code("active"))
///     .with("name", QueryValue::string("Main St Clinic"));
/// assert_eq!(locations.search(&query).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchEngine {
    inner: Arc<EngineInner>,
}

impl SearchEngine {
    /// Creates an engine over a populated registry and a record store.
    ///
    /// The path evaluator reads element schemas from the same registry.
    pub fn new(
        registry: SearchParameterRegistry,
        store: Arc<dyn ResourceStore>,
        config: EngineConfig,
    ) -> Self {
        let registry = Arc::new(RwLock::new(registry));
        let evaluator: Arc<dyn PathEvaluator> = Arc::new(JsonPathEvaluator::new(registry.clone()));
        Self::with_evaluator(registry, evaluator, store, config)
    }

    /// Creates an engine with a custom path evaluator.
    pub fn with_evaluator(
        registry: Arc<RwLock<SearchParameterRegistry>>,
        evaluator: Arc<dyn PathEvaluator>,
        store: Arc<dyn ResourceStore>,
        config: EngineConfig,
    ) -> Self {
        let handles = Arc::new(HandleTable::new(registry.clone(), store.clone()));

        let inner = EngineInner {
            extractor: SearchParameterExtractor::new(registry.clone(), evaluator.clone()),
            references: ReferenceExtractor::new(registry.clone(), evaluator, handles.clone()),
            coordinator: SearchCoordinator::new(registry.clone(), config.unknown_parameters),
            registry,
            store,
            handles,
            config,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Creates an engine over an in-memory SQLite store with the embedded
    /// resource definitions.
    #[cfg(feature = "sqlite")]
    pub fn in_memory() -> StorageResult<Self> {
        let config = EngineConfig::default();
        let backend = SqliteBackend::with_config(":memory:", config.sqlite.clone())?;
        Self::with_sqlite(backend, config)
    }

    /// Opens or creates a file-backed SQLite store with the embedded
    /// resource definitions.
    #[cfg(feature = "sqlite")]
    pub fn open_sqlite<P: AsRef<Path>>(path: P, config: EngineConfig) -> StorageResult<Self> {
        let backend = SqliteBackend::with_config(path, config.sqlite.clone())?;
        Self::with_sqlite(backend, config)
    }

    #[cfg(feature = "sqlite")]
    fn with_sqlite(backend: SqliteBackend, config: EngineConfig) -> StorageResult<Self> {
        backend.init_schema()?;

        let mut registry = SearchParameterRegistry::new();
        let loaded = SchemaLoader::new().populate(&mut registry)?;
        tracing::info!(resource_types = loaded, "loaded embedded resource definitions");

        Ok(Self::new(registry, Arc::new(backend), config))
    }

    /// Returns the access object for a registered resource type.
    ///
    /// # Errors
    ///
    /// * `SchemaError::UnknownResourceType` - the type has no registered schema
    pub fn dao(&self, resource_type: &str) -> StorageResult<ResourceDao> {
        if !self.inner.registry.read().contains_type(resource_type) {
            return Err(SchemaError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            }
            .into());
        }
        Ok(ResourceDao::new(resource_type, self.inner.clone()))
    }

    /// Registers an additional resource schema.
    ///
    /// If the handle table has already been built it is rebuilt, so the new
    /// type is immediately usable as a reference target.
    pub fn register_schema(&self, schema: ResourceSchema) -> StorageResult<()> {
        let resource_type = schema.resource_type.clone();
        self.inner.registry.write().register(schema)?;

        if self.inner.handles.is_initialized() {
            tracing::debug!(%resource_type, "refreshing resource handle table");
            self.inner.handles.refresh();
        }
        Ok(())
    }

    /// The resource handle table used for reference resolution.
    pub fn handles(&self) -> Arc<HandleTable> {
        self.inner.handles.clone()
    }

    /// The shared schema registry.
    pub fn registry(&self) -> Arc<RwLock<SearchParameterRegistry>> {
        self.inner.registry.clone()
    }

    /// The record store.
    pub fn store(&self) -> Arc<dyn ResourceStore> {
        self.inner.store.clone()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}
