//! Resource schema loader.
//!
//! Loads resource schemas from two sources:
//! - Embedded definitions for the built-in resource types
//! - JSON documents supplied at runtime (inline or from a configuration file)

use std::path::Path;

use serde_json::Value;

use crate::error::{SchemaError, StorageError, StorageResult};
use crate::types::ValueKind;

use super::element::{DataType, ElementDefinition};
use super::registry::{ResourceSchema, SearchParamDef, SearchParameterRegistry};

/// Loader for resource schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaLoader;

impl SchemaLoader {
    /// Creates a loader.
    pub fn new() -> Self {
        Self
    }

    /// Registers the embedded schemas into a registry.
    pub fn populate(&self, registry: &mut SearchParameterRegistry) -> StorageResult<usize> {
        let schemas = self.load_embedded();
        let count = schemas.len();
        for schema in schemas {
            registry.register(schema)?;
        }
        tracing::info!("Loaded {} embedded resource schemas into registry", count);
        Ok(count)
    }

    /// Parses schemas from JSON.
    ///
    /// Accepts a single schema object, an array of schemas, or an object with
    /// a `resources` array.
    pub fn load_from_json(&self, json: &Value) -> StorageResult<Vec<ResourceSchema>> {
        let items: Vec<Value> = match json {
            Value::Array(items) => items.clone(),
            Value::Object(obj) => match obj.get("resources") {
                Some(Value::Array(items)) => items.clone(),
                Some(_) => {
                    return Err(SchemaError::InvalidDefinition {
                        message: "'resources' must be an array".to_string(),
                    }
                    .into());
                }
                None => vec![json.clone()],
            },
            _ => {
                return Err(SchemaError::InvalidDefinition {
                    message: "schema document must be an object or array".to_string(),
                }
                .into());
            }
        };

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<ResourceSchema>(item).map_err(|e| {
                    StorageError::from(SchemaError::InvalidDefinition {
                        message: e.to_string(),
                    })
                })
            })
            .collect()
    }

    /// Reads schemas from a JSON configuration file.
    pub fn load_config(&self, config_path: &Path) -> StorageResult<Vec<ResourceSchema>> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            SchemaError::InvalidDefinition {
                message: format!("cannot read {}: {}", config_path.display(), e),
            }
        })?;
        let json: Value = serde_json::from_str(&content).map_err(|e| {
            SchemaError::InvalidDefinition {
                message: format!("cannot parse {}: {}", config_path.display(), e),
            }
        })?;
        self.load_from_json(&json)
    }

    /// Returns the built-in resource schemas.
    pub fn load_embedded(&self) -> Vec<ResourceSchema> {
        vec![location(), observation(), organization(), patient()]
    }
}

fn el(path: &str, types: &[DataType]) -> ElementDefinition {
    ElementDefinition::new(path, types.to_vec())
}

fn location() -> ResourceSchema {
    ResourceSchema::new("Location")
        .element(el("Location.identifier", &[DataType::Identifier]))
        .element(el("Location.name", &[DataType::String]))
        .element(el("Location.description", &[DataType::String]))
        .element(el("Location.type", &[DataType::CodeableConcept]))
        .element(el("Location.telecom", &[DataType::Other("ContactPoint".into())]).repeating())
        .element(el("Location.address", &[DataType::Address]))
        .element(el("Location.status", &[DataType::Code]))
        .element(el("Location.mode", &[DataType::Code]))
        .element(el("Location.partOf", &[DataType::Reference]))
        .element(el("Location.managingOrganization", &[DataType::Reference]))
        .param(
            SearchParamDef::new("identifier", ValueKind::Token, "Location.identifier")
                .with_description("Unique code or number identifying the location to its users"),
        )
        .param(
            SearchParamDef::new("name", ValueKind::String, "Location.name")
                .with_description("A (portion of the) name of the location"),
        )
        .param(
            SearchParamDef::new("type", ValueKind::Token, "Location.type")
                .with_description("A code for the type of location"),
        )
        .param(
            SearchParamDef::new("address", ValueKind::String, "Location.address")
                .with_description("A (part of the) address of the location"),
        )
        .param(
            SearchParamDef::new("status", ValueKind::Token, "Location.status")
                .with_description("Searches for locations with a specific kind of status"),
        )
        .param(
            SearchParamDef::new("partof", ValueKind::Reference, "Location.partOf")
                .with_targets(vec!["Location"])
                .with_description("The location of which this location is a part"),
        )
        .param(
            SearchParamDef::new("organization", ValueKind::Reference, "Location.managingOrganization")
                .with_targets(vec!["Organization"]),
        )
}

fn organization() -> ResourceSchema {
    ResourceSchema::new("Organization")
        .element(el("Organization.identifier", &[DataType::Identifier]).repeating())
        .element(el("Organization.active", &[DataType::Boolean]))
        .element(el("Organization.type", &[DataType::CodeableConcept]).repeating())
        .element(el("Organization.name", &[DataType::String]))
        .element(el("Organization.address", &[DataType::Address]).repeating())
        .element(el("Organization.partOf", &[DataType::Reference]))
        .param(SearchParamDef::new("identifier", ValueKind::Token, "Organization.identifier"))
        .param(SearchParamDef::new("active", ValueKind::Token, "Organization.active"))
        .param(SearchParamDef::new("type", ValueKind::Token, "Organization.type"))
        .param(SearchParamDef::new("name", ValueKind::String, "Organization.name"))
        .param(SearchParamDef::new("address", ValueKind::String, "Organization.address"))
        .param(
            SearchParamDef::new("partof", ValueKind::Reference, "Organization.partOf")
                .with_targets(vec!["Organization"]),
        )
}

fn patient() -> ResourceSchema {
    ResourceSchema::new("Patient")
        .element(el("Patient.identifier", &[DataType::Identifier]).repeating())
        .element(el("Patient.active", &[DataType::Boolean]))
        .element(el("Patient.name", &[DataType::HumanName]).repeating())
        .element(el("Patient.name.family", &[DataType::String]).repeating())
        .element(el("Patient.gender", &[DataType::Code]))
        .element(el("Patient.birthDate", &[DataType::Date]))
        .element(el("Patient.deceased[x]", &[DataType::Boolean, DataType::DateTime]))
        .element(el("Patient.address", &[DataType::Address]).repeating())
        .element(el("Patient.managingOrganization", &[DataType::Reference]))
        .element(el("Patient.link.other", &[DataType::Reference]).repeating())
        .param(SearchParamDef::new("identifier", ValueKind::Token, "Patient.identifier"))
        .param(SearchParamDef::new("active", ValueKind::Token, "Patient.active"))
        .param(SearchParamDef::new("name", ValueKind::String, "Patient.name"))
        .param(SearchParamDef::new("family", ValueKind::String, "Patient.name.family"))
        .param(SearchParamDef::new("gender", ValueKind::Token, "Patient.gender"))
        .param(SearchParamDef::new("birthdate", ValueKind::Date, "Patient.birthDate"))
        .param(SearchParamDef::new("deceased", ValueKind::Date, "Patient.deceased[x]"))
        .param(SearchParamDef::new("address", ValueKind::String, "Patient.address"))
        .param(
            SearchParamDef::new("organization", ValueKind::Reference, "Patient.managingOrganization")
                .with_targets(vec!["Organization"]),
        )
        .param(
            SearchParamDef::new("link", ValueKind::Reference, "Patient.link.other")
                .with_targets(vec!["Patient"]),
        )
}

fn observation() -> ResourceSchema {
    let value_types = [
        DataType::Quantity,
        DataType::CodeableConcept,
        DataType::String,
        DataType::Boolean,
        DataType::Integer,
        DataType::Period,
        DataType::Other("Range".into()),
        DataType::Other("Ratio".into()),
        DataType::Other("SampledData".into()),
    ];

    ResourceSchema::new("Observation")
        .element(el("Observation.identifier", &[DataType::Identifier]).repeating())
        .element(el("Observation.status", &[DataType::Code]))
        .element(el("Observation.category", &[DataType::CodeableConcept]).repeating())
        .element(el("Observation.code", &[DataType::CodeableConcept]))
        .element(el("Observation.subject", &[DataType::Reference]))
        .element(el(
            "Observation.effective[x]",
            &[DataType::DateTime, DataType::Period, DataType::Instant],
        ))
        .element(el("Observation.issued", &[DataType::Instant]))
        .element(el("Observation.performer", &[DataType::Reference]).repeating())
        .element(el("Observation.value[x]", &value_types))
        .element(el("Observation.focus[x]", &[DataType::Reference, DataType::Identifier]))
        .param(SearchParamDef::new("identifier", ValueKind::Token, "Observation.identifier"))
        .param(SearchParamDef::new("status", ValueKind::Token, "Observation.status"))
        .param(SearchParamDef::new("category", ValueKind::Token, "Observation.category"))
        .param(SearchParamDef::new("code", ValueKind::Token, "Observation.code"))
        .param(
            SearchParamDef::new("subject", ValueKind::Reference, "Observation.subject")
                .with_targets(vec!["Patient", "Location", "Group", "Device"]),
        )
        .param(SearchParamDef::new("date", ValueKind::Date, "Observation.effective[x]"))
        .param(SearchParamDef::new("issued", ValueKind::Date, "Observation.issued"))
        .param(
            SearchParamDef::new("performer", ValueKind::Reference, "Observation.performer")
                .with_targets(vec!["Organization", "Patient"]),
        )
        .param(SearchParamDef::new(
            "value-quantity",
            ValueKind::Quantity,
            "Observation.value[x]",
        ))
        .param(SearchParamDef::new(
            "value-concept",
            ValueKind::Token,
            "Observation.value[x]",
        ))
        .param(SearchParamDef::new(
            "value-string",
            ValueKind::String,
            "Observation.value[x]",
        ))
        .param(
            SearchParamDef::new("focus", ValueKind::Reference, "Observation.focus[x]")
                .with_targets(vec!["Patient", "Location", "Organization"]),
        )
}
