//! Search parameter value extractor.
//!
//! Walks the search parameter definitions of a resource type, evaluates each
//! path and converts the located values into index entries. Reference
//! parameters are handled by [`ReferenceExtractor`](super::ReferenceExtractor).

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{ResourceError, SchemaError, StorageResult};
use crate::schema::{PathEvaluator, SearchParamDef, SearchParameterRegistry};
use crate::types::{IndexEntry, ValueKind, canonicalize};

use super::converters::ValueConverter;

/// Extracts index entries for token, string, number, quantity and date parameters.
pub struct SearchParameterExtractor {
    registry: Arc<RwLock<SearchParameterRegistry>>,
    evaluator: Arc<dyn PathEvaluator>,
}

impl SearchParameterExtractor {
    /// Creates a new extractor.
    pub fn new(
        registry: Arc<RwLock<SearchParameterRegistry>>,
        evaluator: Arc<dyn PathEvaluator>,
    ) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    /// Extracts entries for every non-reference parameter of the type.
    ///
    /// The result is sorted and free of duplicates.
    pub fn extract(&self, resource: &Value, resource_type: &str) -> StorageResult<Vec<IndexEntry>> {
        validate_resource(resource, resource_type)?;

        let params = {
            let registry = self.registry.read();
            registry.definitions_for(resource_type)
        };

        let mut entries = Vec::new();
        for param in params.iter().filter(|p| p.kind != ValueKind::Reference) {
            self.extract_for_param(resource, resource_type, param, &mut entries)?;
        }

        canonicalize(&mut entries);
        tracing::debug!(
            resource_type,
            entries = entries.len(),
            "extracted search index entries"
        );
        Ok(entries)
    }

    /// Extracts entries for the parameters of one value kind.
    pub fn extract_kind(
        &self,
        resource: &Value,
        resource_type: &str,
        kind: ValueKind,
    ) -> StorageResult<Vec<IndexEntry>> {
        validate_resource(resource, resource_type)?;

        let params = {
            let registry = self.registry.read();
            registry.definitions_of_kind(resource_type, kind)
        };

        let mut entries = Vec::new();
        for param in &params {
            self.extract_for_param(resource, resource_type, param, &mut entries)?;
        }
        canonicalize(&mut entries);
        Ok(entries)
    }

    fn extract_for_param(
        &self,
        resource: &Value,
        resource_type: &str,
        param: &SearchParamDef,
        entries: &mut Vec<IndexEntry>,
    ) -> StorageResult<()> {
        for value in self.evaluator.evaluate(resource, &param.path)? {
            match ValueConverter::convert(param.kind, &value) {
                Some(converted) => entries.extend(
                    converted
                        .into_iter()
                        .map(|v| IndexEntry::new(param.name.clone(), v)),
                ),
                None if param.is_multi_type() => {
                    tracing::trace!(
                        param = %param.name,
                        found = value.type_name(),
                        "skipping value owned by another kind"
                    );
                }
                None => {
                    return Err(SchemaError::KindMismatch {
                        resource_type: resource_type.to_string(),
                        param_name: param.name.clone(),
                        path: param.path.clone(),
                        expected: param.kind,
                        found: value.type_name().to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Checks that a body is a JSON object of the expected type.
pub fn validate_resource(resource: &Value, resource_type: &str) -> StorageResult<()> {
    let obj = resource.as_object().ok_or_else(|| ResourceError::Invalid {
        resource_type: resource_type.to_string(),
        message: "resource must be a JSON object".to_string(),
    })?;

    if let Some(rt) = obj.get("resourceType") {
        if rt.as_str() != Some(resource_type) {
            return Err(ResourceError::Invalid {
                resource_type: resource_type.to_string(),
                message: format!("resourceType mismatch: found {}", rt),
            }
            .into());
        }
    }
    Ok(())
}
