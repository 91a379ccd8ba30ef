//! Typed element values produced by the path evaluator.
//!
//! Each located JSON value is tagged with the data type the schema declares
//! for it. Values whose JSON shape does not fit the declared type become
//! [`ElementValue::Unrecognized`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::datetime::DateBounds;

use super::element::DataType;

/// A coded value with an optional system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingValue {
    /// Code system URI.
    pub system: Option<String>,
    /// The code.
    pub code: Option<String>,
}

/// A value located inside a resource, tagged by data type.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// A `code` primitive.
    Code(String),
    /// A `string` primitive.
    String(String),
    /// A `uri` primitive.
    Uri(String),
    /// A `boolean` primitive.
    Boolean(bool),
    /// An `integer` primitive.
    Integer(i64),
    /// A `decimal` primitive, exactly as written.
    Decimal(Decimal),
    /// A date, date-time or instant, at the first instant it covers.
    DateTime(DateTime<Utc>),
    /// A business identifier.
    Identifier {
        /// Namespace of the identifier.
        system: Option<String>,
        /// The identifier value.
        value: Option<String>,
    },
    /// A single coding.
    Coding(CodingValue),
    /// A set of codings with optional text.
    CodeableConcept {
        /// The codings, in document order.
        codings: Vec<CodingValue>,
        /// Plain-text representation.
        text: Option<String>,
    },
    /// A person's name.
    HumanName {
        /// Family name parts.
        family: Vec<String>,
        /// Given names.
        given: Vec<String>,
        /// Full text of the name.
        text: Option<String>,
    },
    /// A postal address.
    Address {
        /// Every populated text part (lines, city, district, state, postal code, country, text).
        parts: Vec<String>,
    },
    /// A measured amount.
    Quantity {
        /// Numeric value.
        value: Option<Decimal>,
        /// Unit system URI.
        system: Option<String>,
        /// Coded unit.
        code: Option<String>,
        /// Human-readable unit.
        unit: Option<String>,
    },
    /// Bounds already widened to the precision of each literal.
    Period {
        /// First covered instant, if the period has a start.
        start: Option<DateTime<Utc>>,
        /// Last covered instant, if the period has an end.
        end: Option<DateTime<Utc>>,
    },
    /// A reference to another resource.
    Reference {
        /// The literal reference text.
        reference: Option<String>,
        /// The declared target type.
        target_type: Option<String>,
    },
    /// A value of a type with no typed representation, or whose shape
    /// contradicts its declared type.
    Unrecognized {
        /// Declared or observed type name.
        type_name: String,
        /// The raw JSON.
        value: Value,
    },
}

impl ElementValue {
    /// Name of the runtime type, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            ElementValue::Code(_) => "code",
            ElementValue::String(_) => "string",
            ElementValue::Uri(_) => "uri",
            ElementValue::Boolean(_) => "boolean",
            ElementValue::Integer(_) => "integer",
            ElementValue::Decimal(_) => "decimal",
            ElementValue::DateTime(_) => "dateTime",
            ElementValue::Identifier { .. } => "Identifier",
            ElementValue::Coding(_) => "Coding",
            ElementValue::CodeableConcept { .. } => "CodeableConcept",
            ElementValue::HumanName { .. } => "HumanName",
            ElementValue::Address { .. } => "Address",
            ElementValue::Quantity { .. } => "Quantity",
            ElementValue::Period { .. } => "Period",
            ElementValue::Reference { .. } => "Reference",
            ElementValue::Unrecognized { type_name, .. } => type_name,
        }
    }

    /// Tags a JSON value with the declared data type.
    pub fn from_json(data_type: &DataType, json: &Value) -> Self {
        Self::convert(data_type, json).unwrap_or_else(|| ElementValue::Unrecognized {
            type_name: data_type.name().to_string(),
            value: json.clone(),
        })
    }

    fn convert(data_type: &DataType, json: &Value) -> Option<Self> {
        let value = match data_type {
            DataType::Code => ElementValue::Code(json.as_str()?.to_string()),
            DataType::String => ElementValue::String(json.as_str()?.to_string()),
            DataType::Uri => ElementValue::Uri(json.as_str()?.to_string()),
            DataType::Boolean => ElementValue::Boolean(json.as_bool()?),
            DataType::Integer => ElementValue::Integer(json.as_i64()?),
            DataType::Decimal => ElementValue::Decimal(json_decimal(json)?),
            DataType::Date | DataType::DateTime | DataType::Instant => {
                ElementValue::DateTime(DateBounds::parse(json.as_str()?)?.start)
            }
            DataType::Identifier => {
                let obj = json.as_object()?;
                ElementValue::Identifier {
                    system: text_field(obj.get("system")),
                    value: text_field(obj.get("value")),
                }
            }
            DataType::Coding => ElementValue::Coding(coding(json)?),
            DataType::CodeableConcept => {
                let obj = json.as_object()?;
                let codings = match obj.get("coding") {
                    Some(list) => list
                        .as_array()?
                        .iter()
                        .map(coding)
                        .collect::<Option<Vec<_>>>()?,
                    None => Vec::new(),
                };
                ElementValue::CodeableConcept {
                    codings,
                    text: text_field(obj.get("text")),
                }
            }
            DataType::HumanName => {
                let obj = json.as_object()?;
                ElementValue::HumanName {
                    family: text_list(obj.get("family"))?,
                    given: text_list(obj.get("given"))?,
                    text: text_field(obj.get("text")),
                }
            }
            DataType::Address => {
                let obj = json.as_object()?;
                let mut parts = text_list(obj.get("line"))?;
                for key in ["city", "district", "state", "postalCode", "country", "text"] {
                    if let Some(part) = text_field(obj.get(key)) {
                        parts.push(part);
                    }
                }
                ElementValue::Address { parts }
            }
            DataType::Quantity => {
                let obj = json.as_object()?;
                let value = match obj.get("value") {
                    Some(v) => Some(json_decimal(v)?),
                    None => None,
                };
                ElementValue::Quantity {
                    value,
                    system: text_field(obj.get("system")),
                    code: text_field(obj.get("code")),
                    unit: text_field(obj.get("unit")),
                }
            }
            DataType::Period => {
                let obj = json.as_object()?;
                let start = match obj.get("start") {
                    Some(v) => Some(DateBounds::parse(v.as_str()?)?.start),
                    None => None,
                };
                let end = match obj.get("end") {
                    Some(v) => Some(DateBounds::parse(v.as_str()?)?.end),
                    None => None,
                };
                ElementValue::Period { start, end }
            }
            DataType::Reference => {
                let obj = json.as_object()?;
                ElementValue::Reference {
                    reference: text_field(obj.get("reference")),
                    target_type: text_field(obj.get("type")),
                }
            }
            DataType::Other(_) => return None,
        };
        Some(value)
    }
}

fn coding(json: &Value) -> Option<CodingValue> {
    let obj = json.as_object()?;
    Some(CodingValue {
        system: text_field(obj.get("system")),
        code: text_field(obj.get("code")),
    })
}

/// Reads an optional string field, treating blank text as absent.
fn text_field(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Reads a field that may hold a single string or a list of strings.
///
/// Returns `None` when the field holds anything else.
fn text_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::String(s)) => {
            let s = s.trim();
            Some(if s.is_empty() { Vec::new() } else { vec![s.to_string()] })
        }
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .filter(|item| !matches!(item, Some(s) if s.is_empty()))
            .collect(),
        Some(_) => None,
    }
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&text).ok())
}
