//! Value converters.
//!
//! Turn tagged element values into normalized index values, one function per
//! value kind. Each converter returns `None` when the element's runtime type
//! does not belong to its kind, and an empty list when the value is
//! semantically empty (blank text, a composite with no parts).

use crate::schema::{CodingValue, ElementValue};
use crate::types::datetime::{max_instant, min_instant};
use crate::types::{IndexValue, ValueKind};

/// Normalizes text for string indexing and string matching.
pub fn normalize_string(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Converter for transforming element values to index values.
pub struct ValueConverter;

impl ValueConverter {
    /// Converts a value for a parameter of the given kind.
    ///
    /// Reference parameters are never converted here; they need the record
    /// store to resolve their target and return `None`.
    pub fn convert(kind: ValueKind, value: &ElementValue) -> Option<Vec<IndexValue>> {
        match kind {
            ValueKind::Token => Self::convert_to_token(value),
            ValueKind::String => Self::convert_to_string(value),
            ValueKind::Number | ValueKind::Quantity => Self::convert_to_number(value),
            ValueKind::Date => Self::convert_to_date(value),
            ValueKind::Reference => None,
        }
    }

    /// Coded values emit (system, code); codeable concepts one row per coding;
    /// plain primitives a code without a system.
    pub fn convert_to_token(value: &ElementValue) -> Option<Vec<IndexValue>> {
        let rows = match value {
            ElementValue::Code(s) | ElementValue::String(s) | ElementValue::Uri(s) => {
                primitive_token(s).into_iter().collect()
            }
            ElementValue::Boolean(b) => vec![token(None, Some(b.to_string()))],
            ElementValue::Identifier { system, value } => coded(system, value).into_iter().collect(),
            ElementValue::Coding(coding) => coding_token(coding).into_iter().collect(),
            ElementValue::CodeableConcept { codings, .. } => {
                codings.iter().filter_map(coding_token).collect()
            }
            _ => return None,
        };
        Some(rows)
    }

    /// Text primitives emit their normalized form; names and addresses emit
    /// one row per component.
    pub fn convert_to_string(value: &ElementValue) -> Option<Vec<IndexValue>> {
        let parts: Vec<&str> = match value {
            ElementValue::String(s) | ElementValue::Code(s) | ElementValue::Uri(s) => vec![s.as_str()],
            ElementValue::HumanName {
                family,
                given,
                text,
            } => family
                .iter()
                .chain(given)
                .chain(text)
                .map(String::as_str)
                .collect(),
            ElementValue::Address { parts } => parts.iter().map(String::as_str).collect(),
            _ => return None,
        };

        Some(
            parts
                .into_iter()
                .map(normalize_string)
                .filter(|s| !s.is_empty())
                .map(|value| IndexValue::String { value })
                .collect(),
        )
    }

    /// Quantities emit value, unit system and unit code (falling back to the
    /// unit text); integers and decimals emit a bare number.
    pub fn convert_to_number(value: &ElementValue) -> Option<Vec<IndexValue>> {
        let rows = match value {
            ElementValue::Quantity {
                value,
                system,
                code,
                unit,
            } => value
                .map(|v| IndexValue::Number {
                    value: v.normalize(),
                    system: system.clone(),
                    units: code.clone().or_else(|| unit.clone()),
                })
                .into_iter()
                .collect(),
            ElementValue::Integer(i) => vec![IndexValue::Number {
                value: (*i).into(),
                system: None,
                units: None,
            }],
            ElementValue::Decimal(d) => vec![IndexValue::Number {
                value: d.normalize(),
                system: None,
                units: None,
            }],
            _ => return None,
        };
        Some(rows)
    }

    /// Instants emit `low == high`; periods emit their bounds, with an open
    /// side widened to the representable extreme.
    pub fn convert_to_date(value: &ElementValue) -> Option<Vec<IndexValue>> {
        let rows = match value {
            ElementValue::DateTime(dt) => vec![IndexValue::Date { low: *dt, high: *dt }],
            ElementValue::Period { start: None, end: None } => Vec::new(),
            ElementValue::Period { start, end } => vec![IndexValue::Date {
                low: start.unwrap_or_else(min_instant),
                high: end.unwrap_or_else(max_instant),
            }],
            _ => return None,
        };
        Some(rows)
    }
}

fn token(system: Option<String>, code: Option<String>) -> IndexValue {
    IndexValue::Token { system, code }
}

fn primitive_token(value: &str) -> Option<IndexValue> {
    let value = value.trim();
    (!value.is_empty()).then(|| token(None, Some(value.to_string())))
}

fn coded(system: &Option<String>, code: &Option<String>) -> Option<IndexValue> {
    if system.is_none() && code.is_none() {
        return None;
    }
    Some(token(system.clone(), code.clone()))
}

fn coding_token(coding: &CodingValue) -> Option<IndexValue> {
    coded(&coding.system, &coding.code)
}
