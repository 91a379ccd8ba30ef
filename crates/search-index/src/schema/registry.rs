//! Schema Registry.
//!
//! Holds, per resource type, the element schema and the declared search
//! parameter definitions. Lookups are deterministic: definitions come back
//! ordered by parameter name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, StorageResult};
use crate::types::ValueKind;

use super::element::ElementDefinition;

/// Declaration of one search parameter of a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParamDef {
    /// Parameter name used in queries (e.g. `status`).
    pub name: String,

    /// Value kind of the parameter.
    pub kind: ValueKind,

    /// Element path, rooted at the resource type (e.g. `Location.status`).
    pub path: String,

    /// Resource types a reference parameter may point at.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SearchParamDef {
    /// Creates a definition.
    pub fn new(name: impl Into<String>, kind: ValueKind, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            targets: Vec::new(),
            description: None,
        }
    }

    /// Sets the reference target types.
    pub fn with_targets(mut self, targets: Vec<&str>) -> Self {
        self.targets = targets.into_iter().map(String::from).collect();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True if the path ends in a type-choice marker, so matched values may be
    /// of several concrete kinds.
    pub fn is_multi_type(&self) -> bool {
        self.path.ends_with("[x]")
    }

    /// The resource type the path is rooted at.
    pub fn root_type(&self) -> &str {
        self.path.split('.').next().unwrap_or_default()
    }
}

/// Complete schema of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// The resource type name.
    pub resource_type: String,

    /// Declared elements.
    #[serde(default)]
    pub elements: Vec<ElementDefinition>,

    /// Declared search parameters.
    #[serde(default)]
    pub search_params: Vec<SearchParamDef>,
}

impl ResourceSchema {
    /// Creates an empty schema.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            elements: Vec::new(),
            search_params: Vec::new(),
        }
    }

    /// Adds an element.
    pub fn element(mut self, element: ElementDefinition) -> Self {
        self.elements.push(element);
        self
    }

    /// Adds a search parameter.
    pub fn param(mut self, def: SearchParamDef) -> Self {
        self.search_params.push(def);
        self
    }
}

#[derive(Debug)]
struct RegisteredType {
    schema: Arc<ResourceSchema>,
    elements: HashMap<String, ElementDefinition>,
    params: BTreeMap<String, Arc<SearchParamDef>>,
}

/// In-memory registry of resource schemas.
#[derive(Debug, Default)]
pub struct SearchParameterRegistry {
    types: BTreeMap<String, RegisteredType>,
}

impl SearchParameterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the schema of a resource type.
    ///
    /// Every search parameter must point at a declared element of the same
    /// type, and parameter names must be unique.
    pub fn register(&mut self, schema: ResourceSchema) -> StorageResult<()> {
        let elements: HashMap<String, ElementDefinition> = schema
            .elements
            .iter()
            .map(|e| (e.path.clone(), e.clone()))
            .collect();

        let mut params = BTreeMap::new();
        for def in &schema.search_params {
            if def.root_type() != schema.resource_type {
                return Err(SchemaError::InvalidDefinition {
                    message: format!(
                        "parameter '{}' of {} has path {} rooted elsewhere",
                        def.name, schema.resource_type, def.path
                    ),
                }
                .into());
            }
            if !elements.contains_key(&def.path) {
                return Err(SchemaError::UnknownElement {
                    path: def.path.clone(),
                }
                .into());
            }
            if params
                .insert(def.name.clone(), Arc::new(def.clone()))
                .is_some()
            {
                return Err(SchemaError::InvalidDefinition {
                    message: format!(
                        "duplicate parameter '{}' for {}",
                        def.name, schema.resource_type
                    ),
                }
                .into());
            }
        }

        tracing::debug!(
            resource_type = %schema.resource_type,
            elements = elements.len(),
            params = params.len(),
            "registered resource schema"
        );

        self.types.insert(
            schema.resource_type.clone(),
            RegisteredType {
                schema: Arc::new(schema),
                elements,
                params,
            },
        );
        Ok(())
    }

    /// Returns the search parameter definitions of a type, ordered by name.
    pub fn definitions_for(&self, resource_type: &str) -> Vec<Arc<SearchParamDef>> {
        self.types
            .get(resource_type)
            .map(|t| t.params.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the definitions of a type with the given value kind.
    pub fn definitions_of_kind(&self, resource_type: &str, kind: ValueKind) -> Vec<Arc<SearchParamDef>> {
        self.definitions_for(resource_type)
            .into_iter()
            .filter(|d| d.kind == kind)
            .collect()
    }

    /// Looks up one search parameter definition.
    pub fn get_param(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParamDef>> {
        self.types
            .get(resource_type)
            .and_then(|t| t.params.get(name).cloned())
    }

    /// Returns the full field schema of a type.
    pub fn field_schema_for(&self, resource_type: &str) -> Option<Arc<ResourceSchema>> {
        self.types.get(resource_type).map(|t| t.schema.clone())
    }

    /// Looks up the element declared at a path.
    pub fn element(&self, resource_type: &str, path: &str) -> Option<&ElementDefinition> {
        self.types
            .get(resource_type)
            .and_then(|t| t.elements.get(path))
    }

    /// Returns true if the resource type is registered.
    pub fn contains_type(&self, resource_type: &str) -> bool {
        self.types.contains_key(resource_type)
    }

    /// Returns every registered resource type, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Returns the number of registered resource types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
