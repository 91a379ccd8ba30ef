//! Element schema: declared data types and cardinality of resource elements.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Data types an element may declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Code,
    String,
    Uri,
    Boolean,
    Integer,
    Decimal,
    Date,
    DateTime,
    Instant,
    Identifier,
    Coding,
    CodeableConcept,
    HumanName,
    Address,
    Quantity,
    Period,
    Reference,
    /// Any type the evaluator has no typed representation for.
    Other(String),
}

impl DataType {
    /// Returns the schema name of the type (`dateTime`, `CodeableConcept`, ...).
    pub fn name(&self) -> &str {
        match self {
            DataType::Code => "code",
            DataType::String => "string",
            DataType::Uri => "uri",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::DateTime => "dateTime",
            DataType::Instant => "instant",
            DataType::Identifier => "Identifier",
            DataType::Coding => "Coding",
            DataType::CodeableConcept => "CodeableConcept",
            DataType::HumanName => "HumanName",
            DataType::Address => "Address",
            DataType::Quantity => "Quantity",
            DataType::Period => "Period",
            DataType::Reference => "Reference",
            DataType::Other(name) => name,
        }
    }

    /// Looks up a type by schema name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "code" => DataType::Code,
            "string" | "markdown" => DataType::String,
            "uri" | "url" | "canonical" => DataType::Uri,
            "boolean" => DataType::Boolean,
            "integer" | "positiveInt" | "unsignedInt" => DataType::Integer,
            "decimal" => DataType::Decimal,
            "date" => DataType::Date,
            "dateTime" => DataType::DateTime,
            "instant" => DataType::Instant,
            "Identifier" => DataType::Identifier,
            "Coding" => DataType::Coding,
            "CodeableConcept" => DataType::CodeableConcept,
            "HumanName" => DataType::HumanName,
            "Address" => DataType::Address,
            "Quantity" => DataType::Quantity,
            "Period" => DataType::Period,
            "Reference" => DataType::Reference,
            other => DataType::Other(other.to_string()),
        }
    }

    /// The suffix a choice element uses for this type (`value[x]` -> `valueDateTime`).
    pub fn choice_suffix(&self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for DataType {
    fn from(name: String) -> Self {
        DataType::from_name(&name)
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.name().to_string()
    }
}

/// Declaration of one element within a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Dotted path rooted at the resource type, e.g. `Location.address`.
    /// Choice elements end in `[x]`.
    pub path: String,

    /// Permitted data types. More than one only for choice elements.
    pub types: Vec<DataType>,

    /// Minimum cardinality.
    #[serde(default)]
    pub min: u32,

    /// Maximum cardinality, `"1"` or `"*"`.
    #[serde(default = "default_max")]
    pub max: String,
}

fn default_max() -> String {
    "1".to_string()
}

impl ElementDefinition {
    /// Creates a single-valued element.
    pub fn new(path: impl Into<String>, types: Vec<DataType>) -> Self {
        Self {
            path: path.into(),
            types,
            min: 0,
            max: default_max(),
        }
    }

    /// Marks the element as repeating.
    pub fn repeating(mut self) -> Self {
        self.max = "*".to_string();
        self
    }

    /// Returns true if the element may occur more than once.
    pub fn is_repeating(&self) -> bool {
        self.max != "1" && self.max != "0"
    }

    /// Returns true for choice elements (`[x]`).
    pub fn is_choice(&self) -> bool {
        self.path.ends_with("[x]")
    }
}
