//! Index rows.
//!
//! An [`IndexEntry`] is one normalized value extracted for one search
//! parameter. The store assigns the owner and keeps it as an [`IndexRow`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::search_params::ValueKind;
use super::stored_resource::ResourceId;

/// The normalized, kind-specific payload of an index row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum IndexValue {
    /// A code with an optional system.
    Token {
        system: Option<String>,
        code: Option<String>,
    },
    /// Normalized text.
    String { value: String },
    /// A number with optional unit system and unit code.
    Number {
        value: Decimal,
        system: Option<String>,
        units: Option<String>,
    },
    /// An instant or interval. Point values have `low == high`.
    Date {
        low: DateTime<Utc>,
        high: DateTime<Utc>,
    },
    /// A resolved reference to another stored resource.
    Reference {
        path: String,
        target_type: String,
        target_id: ResourceId,
    },
}

impl IndexValue {
    /// The storage discriminator shared by all rows of this shape.
    pub fn column_kind(&self) -> &'static str {
        match self {
            IndexValue::Token { .. } => "token",
            IndexValue::String { .. } => "string",
            IndexValue::Number { .. } => "number",
            IndexValue::Date { .. } => "date",
            IndexValue::Reference { .. } => "reference",
        }
    }
}

/// Storage discriminator for rows produced by parameters of `kind`.
pub fn column_kind_for(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Token => "token",
        ValueKind::String => "string",
        ValueKind::Number | ValueKind::Quantity => "number",
        ValueKind::Date => "date",
        ValueKind::Reference => "reference",
    }
}

/// A value extracted for one search parameter, not yet bound to an owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The search parameter name.
    pub param_name: String,
    /// The extracted value.
    pub value: IndexValue,
}

impl IndexEntry {
    /// Creates an entry.
    pub fn new(param_name: impl Into<String>, value: IndexValue) -> Self {
        Self {
            param_name: param_name.into(),
            value,
        }
    }
}

/// A stored index row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexRow {
    /// Type of the owning resource.
    pub resource_type: String,
    /// Id of the owning resource.
    pub resource_id: ResourceId,
    /// The indexed value.
    pub entry: IndexEntry,
}

/// Sorts and deduplicates entries so equal inputs yield identical row sets.
pub fn canonicalize(entries: &mut Vec<IndexEntry>) {
    entries.sort();
    entries.dedup();
}
