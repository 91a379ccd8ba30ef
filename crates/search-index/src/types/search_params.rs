//! Search parameter and query types.
//!
//! A [`SearchQuery`] maps parameter names to OR-groups of typed
//! [`QueryValue`]s. Groups under one name are ANDed; values inside a group
//! are ORed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::search::references::split_reference;

use super::datetime::DateBounds;
use super::stored_resource::ResourceId;

/// Value kinds of search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// A code, optionally qualified by a system.
    Token,
    /// Free text.
    String,
    /// A plain number.
    Number,
    /// A number with units.
    Quantity,
    /// A date, date-time or period.
    Date,
    /// A reference to another stored resource.
    Reference,
}

impl ValueKind {
    /// Returns true for kinds that share numeric index rows.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Quantity)
    }

    /// True if a query value of kind `other` may be applied to a parameter of this kind.
    pub fn accepts(&self, other: ValueKind) -> bool {
        *self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Token => write!(f, "token"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::Quantity => write!(f, "quantity"),
            ValueKind::Date => write!(f, "date"),
            ValueKind::Reference => write!(f, "reference"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "token" => Ok(ValueKind::Token),
            "string" => Ok(ValueKind::String),
            "number" => Ok(ValueKind::Number),
            "quantity" => Ok(ValueKind::Quantity),
            "date" => Ok(ValueKind::Date),
            "reference" => Ok(ValueKind::Reference),
            _ => Err(format!("unknown value kind: {}", s)),
        }
    }
}

/// Comparison prefixes for numeric and date values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrefix {
    /// Equal (default).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Starts after.
    Sa,
    /// Ends before.
    Eb,
    /// Approximately equal.
    Ap,
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPrefix::Eq => write!(f, "eq"),
            SearchPrefix::Ne => write!(f, "ne"),
            SearchPrefix::Gt => write!(f, "gt"),
            SearchPrefix::Lt => write!(f, "lt"),
            SearchPrefix::Ge => write!(f, "ge"),
            SearchPrefix::Le => write!(f, "le"),
            SearchPrefix::Sa => write!(f, "sa"),
            SearchPrefix::Eb => write!(f, "eb"),
            SearchPrefix::Ap => write!(f, "ap"),
        }
    }
}

impl FromStr for SearchPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(SearchPrefix::Eq),
            "ne" => Ok(SearchPrefix::Ne),
            "gt" => Ok(SearchPrefix::Gt),
            "lt" => Ok(SearchPrefix::Lt),
            "ge" => Ok(SearchPrefix::Ge),
            "le" => Ok(SearchPrefix::Le),
            "sa" => Ok(SearchPrefix::Sa),
            "eb" => Ok(SearchPrefix::Eb),
            "ap" => Ok(SearchPrefix::Ap),
            _ => Err(format!("unknown search prefix: {}", s)),
        }
    }
}

impl SearchPrefix {
    /// Extracts a prefix from the beginning of a value string.
    ///
    /// Returns the prefix and the remaining value.
    pub fn extract(value: &str) -> (Option<Self>, &str) {
        if value.len() >= 2 && value.is_char_boundary(2) {
            let prefix = &value[..2];
            if let Ok(p) = prefix.parse() {
                return (Some(p), &value[2..]);
            }
        }
        (None, value)
    }
}

/// A typed value supplied in a search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum QueryValue {
    /// Matches token rows on whichever parts are present.
    Token {
        system: Option<String>,
        code: Option<String>,
    },
    /// Matches string rows exactly after normalization.
    String { value: String },
    /// Compares numeric rows.
    Number {
        value: Decimal,
        comparator: Option<SearchPrefix>,
        system: Option<String>,
        units: Option<String>,
    },
    /// Bounds date rows.
    Date {
        lower: Option<DateTime<Utc>>,
        upper: Option<DateTime<Utc>>,
    },
    /// Matches reference rows pointing at a target.
    Reference {
        resource_type: Option<String>,
        id: ResourceId,
    },
}

impl QueryValue {
    /// A token with a code and no system constraint.
    pub fn code(code: impl Into<String>) -> Self {
        QueryValue::Token {
            system: None,
            code: Some(code.into()),
        }
    }

    /// A token constrained on both system and code.
    pub fn token(system: impl Into<String>, code: impl Into<String>) -> Self {
        QueryValue::Token {
            system: Some(system.into()),
            code: Some(code.into()),
        }
    }

    /// Parses `system|code`, `|code`, `system|` or a bare `code`.
    pub fn parse_token(value: &str) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        match value.split_once('|') {
            Some((system, code)) => QueryValue::Token {
                system: non_empty(system),
                code: non_empty(code),
            },
            None => QueryValue::Token {
                system: None,
                code: non_empty(value),
            },
        }
    }

    /// A string value.
    pub fn string(value: impl Into<String>) -> Self {
        QueryValue::String {
            value: value.into(),
        }
    }

    /// A number with an optional comparator.
    pub fn number(value: Decimal, comparator: Option<SearchPrefix>) -> Self {
        QueryValue::Number {
            value,
            comparator,
            system: None,
            units: None,
        }
    }

    /// Parses a prefixed number such as `ge5` or `3.25`.
    pub fn parse_number(value: &str) -> Result<Self, SearchError> {
        let (comparator, rest) = SearchPrefix::extract(value.trim());
        let number = Decimal::from_str(rest)
            .or_else(|_| Decimal::from_scientific(rest))
            .map_err(|e| malformed(value, format!("not a number: {}", e)))?;
        Ok(Self::number(number, comparator))
    }

    /// Adds unit constraints to a number value. No-op for other kinds.
    pub fn with_units(self, system: Option<String>, units: Option<String>) -> Self {
        match self {
            QueryValue::Number {
                value, comparator, ..
            } => QueryValue::Number {
                value,
                comparator,
                system,
                units,
            },
            other => other,
        }
    }

    /// A date range between two literals of any precision.
    ///
    /// The lower bound takes the first instant of its literal and the upper
    /// bound the last.
    pub fn date_between(lower: Option<&str>, upper: Option<&str>) -> Result<Self, SearchError> {
        let lower = lower.map(parse_date_bounds).transpose()?;
        let upper = upper.map(parse_date_bounds).transpose()?;
        Ok(QueryValue::Date {
            lower: lower.map(|b| b.start),
            upper: upper.map(|b| b.end),
        })
    }

    /// Parses a prefixed date such as `ge2019-01-01`.
    ///
    /// `ge` bounds below at the literal's first instant and `le` bounds above
    /// at its last. The strict `gt`/`sa` start one microsecond after the
    /// literal ends, and `lt`/`eb` stop one microsecond before it starts.
    /// `eq` (or no prefix) yields both bounds of the literal.
    pub fn parse_date(value: &str) -> Result<Self, SearchError> {
        let (prefix, rest) = SearchPrefix::extract(value.trim());
        let bounds = parse_date_bounds(rest)?;
        let tick = Duration::microseconds(1);
        let (lower, upper) = match prefix.unwrap_or_default() {
            SearchPrefix::Eq => (Some(bounds.start), Some(bounds.end)),
            SearchPrefix::Ge => (Some(bounds.start), None),
            SearchPrefix::Gt | SearchPrefix::Sa => (Some(bounds.end + tick), None),
            SearchPrefix::Le => (None, Some(bounds.end)),
            SearchPrefix::Lt | SearchPrefix::Eb => (None, Some(bounds.start - tick)),
            other => {
                return Err(malformed(value, format!("prefix '{}' is not supported for dates", other)));
            }
        };
        Ok(QueryValue::Date { lower, upper })
    }

    /// A reference to a stored resource.
    pub fn reference(resource_type: Option<&str>, id: ResourceId) -> Self {
        QueryValue::Reference {
            resource_type: resource_type.map(str::to_string),
            id,
        }
    }

    /// Parses `[base/]Type/id[/_history/vid]` or a bare `id`, the same
    /// shapes accepted when references are indexed.
    pub fn parse_reference(value: &str) -> Result<Self, SearchError> {
        let (resource_type, id) = split_reference(value);
        let id = id
            .parse::<ResourceId>()
            .map_err(|e| malformed(value, format!("invalid reference id: {}", e)))?;
        Ok(Self::reference(resource_type, id))
    }

    /// Returns the value kind this query value targets.
    pub fn kind(&self) -> ValueKind {
        match self {
            QueryValue::Token { .. } => ValueKind::Token,
            QueryValue::String { .. } => ValueKind::String,
            QueryValue::Number { .. } => ValueKind::Number,
            QueryValue::Date { .. } => ValueKind::Date,
            QueryValue::Reference { .. } => ValueKind::Reference,
        }
    }
}

fn parse_date_bounds(value: &str) -> Result<DateBounds, SearchError> {
    DateBounds::parse(value).ok_or_else(|| malformed(value, "invalid date".to_string()))
}

fn malformed(value: &str, message: String) -> SearchError {
    SearchError::MalformedValue {
        value: value.to_string(),
        message,
    }
}

/// A multi-parameter search query (AND of OR-groups).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    parameters: BTreeMap<String, Vec<Vec<QueryValue>>>,
}

impl SearchQuery {
    /// Creates an empty query, which matches every resource of the type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an OR-group under a parameter name.
    pub fn and<I>(mut self, name: impl Into<String>, group: I) -> Self
    where
        I: IntoIterator<Item = QueryValue>,
    {
        self.parameters
            .entry(name.into())
            .or_default()
            .push(group.into_iter().collect());
        self
    }

    /// Adds a single-value group under a parameter name.
    pub fn with(self, name: impl Into<String>, value: QueryValue) -> Self {
        self.and(name, [value])
    }

    /// Returns true if no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Iterates parameters and their OR-groups.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &[Vec<QueryValue>])> {
        self.parameters
            .iter()
            .map(|(name, groups)| (name.as_str(), groups.as_slice()))
    }
}
