//! Reference resolution.
//!
//! Reference parameters do not index the literal reference text. Each value
//! is resolved to a registered target type, the target record is looked up
//! through that type's [`ResourceHandle`], and the row records the target's
//! stored id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::core::ResourceStore;
use crate::error::{ResourceError, SchemaError, StorageResult};
use crate::schema::{ElementValue, PathEvaluator, SearchParamDef, SearchParameterRegistry};
use crate::types::{IndexEntry, IndexValue, ResourceId, StoredResource, ValueKind, canonicalize};

use super::extractor::validate_resource;

/// `[base/]Type/id[/_history/vid]`
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*/)?([A-Z][A-Za-z]+)/([^/]+)(?:/_history/[^/]+)?$")
        .expect("Invalid reference regex")
});

/// Store access for one resource type.
#[derive(Clone)]
pub struct ResourceHandle {
    resource_type: String,
    store: Arc<dyn ResourceStore>,
}

impl ResourceHandle {
    /// The resource type served by this handle.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Looks up a record of this type.
    pub async fn find(&self, id: ResourceId) -> StorageResult<StoredResource> {
        self.store.find_by_id(&self.resource_type, id).await
    }
}

/// Resource type to handle mapping, built on first use.
///
/// The first user builds the map under the write lock; concurrent first
/// users wait on the lock and then share that one map. Registering a new
/// schema calls [`HandleTable::refresh`], which swaps in a rebuilt map so
/// later types become reference targets too.
pub struct HandleTable {
    registry: Arc<RwLock<SearchParameterRegistry>>,
    store: Arc<dyn ResourceStore>,
    handles: RwLock<Option<Arc<HashMap<String, ResourceHandle>>>>,
    builds: AtomicUsize,
}

impl HandleTable {
    /// Creates an empty table.
    pub fn new(registry: Arc<RwLock<SearchParameterRegistry>>, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            registry,
            store,
            handles: RwLock::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Returns the handle for a registered type.
    pub fn get(&self, resource_type: &str) -> Option<ResourceHandle> {
        self.handles().get(resource_type).cloned()
    }

    /// True once the table has been built.
    pub fn is_initialized(&self) -> bool {
        self.handles.read().is_some()
    }

    /// Number of times the map has been built.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }

    /// Rebuilds the map from the registry if it has already been built.
    ///
    /// An unbuilt table stays unbuilt; its first use will see the current
    /// registry anyway.
    pub fn refresh(&self) {
        let mut slot = self.handles.write();
        if slot.is_some() {
            *slot = Some(Arc::new(self.build()));
        }
    }

    fn handles(&self) -> Arc<HashMap<String, ResourceHandle>> {
        if let Some(map) = self.handles.read().as_ref() {
            return map.clone();
        }

        let mut slot = self.handles.write();
        // Another caller may have built it while we waited.
        if let Some(map) = slot.as_ref() {
            return map.clone();
        }
        let map = Arc::new(self.build());
        *slot = Some(map.clone());
        map
    }

    fn build(&self) -> HashMap<String, ResourceHandle> {
        let types = self.registry.read().resource_types();
        let build = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(types = types.len(), build, "built resource handle table");
        types
            .into_iter()
            .map(|resource_type| {
                let handle = ResourceHandle {
                    resource_type: resource_type.clone(),
                    store: self.store.clone(),
                };
                (resource_type, handle)
            })
            .collect()
    }
}

/// Extracts index entries for reference parameters.
pub struct ReferenceExtractor {
    registry: Arc<RwLock<SearchParameterRegistry>>,
    evaluator: Arc<dyn PathEvaluator>,
    handles: Arc<HandleTable>,
}

impl ReferenceExtractor {
    /// Creates a reference extractor.
    pub fn new(
        registry: Arc<RwLock<SearchParameterRegistry>>,
        evaluator: Arc<dyn PathEvaluator>,
        handles: Arc<HandleTable>,
    ) -> Self {
        Self {
            registry,
            evaluator,
            handles,
        }
    }

    /// Resolves every reference parameter of the type.
    ///
    /// # Errors
    ///
    /// * `SchemaError::UnresolvedReferenceType` - single-type path, target type unknown
    /// * `ResourceError::InvalidReference` - single-type path, id is not a stored id
    /// * `ResourceError::NotFound` - the target record does not exist
    pub async fn extract(&self, resource: &Value, resource_type: &str) -> StorageResult<Vec<IndexEntry>> {
        validate_resource(resource, resource_type)?;

        let params = {
            let registry = self.registry.read();
            registry.definitions_of_kind(resource_type, ValueKind::Reference)
        };

        let mut entries = Vec::new();
        for param in &params {
            for value in self.evaluator.evaluate(resource, &param.path)? {
                if let Some(entry) = self.resolve(resource_type, param, value).await? {
                    entries.push(entry);
                }
            }
        }

        canonicalize(&mut entries);
        Ok(entries)
    }

    async fn resolve(
        &self,
        resource_type: &str,
        param: &SearchParamDef,
        value: ElementValue,
    ) -> StorageResult<Option<IndexEntry>> {
        let multi = param.is_multi_type();

        let (reference, declared_type) = match value {
            ElementValue::Reference {
                reference,
                target_type,
            } => (reference, target_type),
            other if multi => {
                tracing::trace!(param = %param.name, found = other.type_name(), "skipping non-reference value");
                return Ok(None);
            }
            other => {
                return Err(SchemaError::KindMismatch {
                    resource_type: resource_type.to_string(),
                    param_name: param.name.clone(),
                    path: param.path.clone(),
                    expected: ValueKind::Reference,
                    found: other.type_name().to_string(),
                }
                .into());
            }
        };

        let Some(reference) = reference else {
            return Ok(None);
        };
        // Contained resources are not stored records.
        if reference.starts_with('#') {
            return Ok(None);
        }

        let (parsed_type, id_text) = split_reference(&reference);
        if id_text.is_empty() {
            return Ok(None);
        }

        let target_type = parsed_type
            .map(str::to_string)
            .or(declared_type)
            .or_else(|| match param.targets.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            })
            .filter(|t| param.targets.is_empty() || param.targets.contains(t));

        let Some(handle) = target_type.as_deref().and_then(|t| self.handles.get(t)) else {
            if multi {
                tracing::warn!(param = %param.name, reference = %reference, "skipping unresolved reference");
                return Ok(None);
            }
            return Err(SchemaError::UnresolvedReferenceType {
                reference,
                path: param.path.clone(),
            }
            .into());
        };

        let id = match id_text.parse::<ResourceId>() {
            Ok(id) => id,
            Err(_) if multi => return Ok(None),
            Err(_) => {
                return Err(ResourceError::InvalidReference {
                    reference,
                    path: param.path.clone(),
                }
                .into());
            }
        };

        let target = handle.find(id).await?;
        Ok(Some(IndexEntry::new(
            param.name.clone(),
            IndexValue::Reference {
                path: param.path.clone(),
                target_type: handle.resource_type().to_string(),
                target_id: target.id(),
            },
        )))
    }
}

/// Splits a reference into its optional type and its id text.
pub fn split_reference(reference: &str) -> (Option<&str>, &str) {
    let reference = reference.trim();
    match REFERENCE_PATTERN.captures(reference) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(t), Some(id)) => (Some(t.as_str()), id.as_str()),
            _ => (None, reference),
        },
        None => (None, reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_relative_reference() {
        assert_eq!(split_reference("Organization/12"), (Some("Organization"), "12"));
    }

    #[test]
    fn test_split_absolute_and_versioned_reference() {
        assert_eq!(
            split_reference("http://example.org/fhir/Location/7/_history/3"),
            (Some("Location"), "7")
        );
    }

    #[test]
    fn test_split_bare_id() {
        assert_eq!(split_reference(" 42 "), (None, "42"));
        assert_eq!(split_reference(""), (None, ""));
    }
}
