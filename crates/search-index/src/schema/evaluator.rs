//! Path evaluation over JSON resource instances.
//!
//! A path is a dotted expression rooted at the resource type, for example
//! `Location.address` or `Observation.value[x]`. Intermediate segments walk
//! into objects and flatten arrays; the final segment is typed from the
//! element schema so callers receive tagged [`ElementValue`]s.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{SchemaError, StorageResult};

use super::registry::SearchParameterRegistry;
use super::value::ElementValue;

/// Locates values inside a resource instance.
pub trait PathEvaluator: Send + Sync {
    /// Returns every value found at `path`, in document order. A path that is
    /// absent from the instance yields an empty list.
    fn evaluate(&self, resource: &Value, path: &str) -> StorageResult<Vec<ElementValue>>;
}

/// Evaluates paths against `serde_json` documents using the registry's
/// element declarations.
pub struct JsonPathEvaluator {
    registry: Arc<RwLock<SearchParameterRegistry>>,
}

impl JsonPathEvaluator {
    /// Creates an evaluator backed by the given registry.
    pub fn new(registry: Arc<RwLock<SearchParameterRegistry>>) -> Self {
        Self { registry }
    }
}

impl PathEvaluator for JsonPathEvaluator {
    fn evaluate(&self, resource: &Value, path: &str) -> StorageResult<Vec<ElementValue>> {
        let unknown = || SchemaError::UnknownElement {
            path: path.to_string(),
        };

        let mut segments: Vec<&str> = path.split('.').collect();
        if segments.len() < 2 {
            return Err(unknown().into());
        }
        let root = segments.remove(0);
        let last = segments.pop().ok_or_else(unknown)?;

        let element = {
            let registry = self.registry.read();
            registry.element(root, path).cloned()
        }
        .ok_or_else(unknown)?;

        let mut nodes = vec![resource];
        for segment in segments {
            nodes = children(&nodes, segment);
        }

        let mut values = Vec::new();
        if let Some(base) = last.strip_suffix("[x]") {
            for node in &nodes {
                let Some(obj) = node.as_object() else {
                    continue;
                };
                for (key, value) in obj {
                    let Some(suffix) = key.strip_prefix(base) else {
                        continue;
                    };
                    if !suffix.starts_with(|c: char| c.is_ascii_uppercase()) {
                        continue;
                    }
                    let declared = element.types.iter().find(|t| t.choice_suffix() == suffix);
                    for item in flatten(value) {
                        values.push(match declared {
                            Some(data_type) => ElementValue::from_json(data_type, item),
                            None => ElementValue::Unrecognized {
                                type_name: suffix.to_string(),
                                value: item.clone(),
                            },
                        });
                    }
                }
            }
        } else {
            let data_type = element.types.first().ok_or_else(unknown)?;
            for item in children(&nodes, last) {
                values.push(ElementValue::from_json(data_type, item));
            }
        }

        Ok(values)
    }
}

fn children<'a>(nodes: &[&'a Value], segment: &str) -> Vec<&'a Value> {
    nodes
        .iter()
        .filter_map(|node| node.get(segment))
        .flat_map(flatten)
        .collect()
}

fn flatten(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
