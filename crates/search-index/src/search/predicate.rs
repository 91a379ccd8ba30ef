//! Predicate construction and candidate narrowing.
//!
//! A query parameter contributes one or more OR-groups. Each group becomes an
//! [`IndexPredicate`]: a disjunction of [`RowCondition`]s over the rows of a
//! single parameter, optionally restricted to the ids that survived earlier
//! groups. The store answers the predicate with the set of owning ids and
//! [`match_group`] intersects it with the running [`CandidateSet`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::ReadSession;
use crate::error::{SchemaError, SearchError, StorageResult};
use crate::schema::SearchParamDef;
use crate::types::{QueryValue, ResourceId, SearchPrefix, ValueKind, column_kind_for};

use super::converters::normalize_string;

/// The working set of ids during a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CandidateSet {
    /// No predicate has been applied yet.
    #[default]
    Unconstrained,
    /// Ids that satisfied every predicate applied so far.
    Constrained(BTreeSet<ResourceId>),
}

impl CandidateSet {
    /// Intersects the set with ids returned by a predicate.
    ///
    /// An unconstrained set is seeded with `matched`; a constrained set can
    /// only shrink.
    pub fn narrow(self, matched: BTreeSet<ResourceId>) -> Self {
        match self {
            CandidateSet::Unconstrained => CandidateSet::Constrained(matched),
            CandidateSet::Constrained(ids) => {
                CandidateSet::Constrained(ids.intersection(&matched).copied().collect())
            }
        }
    }

    /// True once narrowing has produced an empty set.
    pub fn is_empty(&self) -> bool {
        matches!(self, CandidateSet::Constrained(ids) if ids.is_empty())
    }

    /// The constrained ids, or `None` when no predicate applied yet.
    pub fn ids(&self) -> Option<&BTreeSet<ResourceId>> {
        match self {
            CandidateSet::Unconstrained => None,
            CandidateSet::Constrained(ids) => Some(ids),
        }
    }
}

/// Value comparison applied to numeric rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Equal.
    Eq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
}

impl Comparator {
    /// The SQL operator for this comparator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }
}

impl TryFrom<SearchPrefix> for Comparator {
    type Error = SearchPrefix;

    fn try_from(prefix: SearchPrefix) -> Result<Self, Self::Error> {
        match prefix {
            SearchPrefix::Eq => Ok(Comparator::Eq),
            SearchPrefix::Gt => Ok(Comparator::Gt),
            SearchPrefix::Ge => Ok(Comparator::Ge),
            SearchPrefix::Lt => Ok(Comparator::Lt),
            SearchPrefix::Le => Ok(Comparator::Le),
            other => Err(other),
        }
    }
}

/// One query value turned into a row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum RowCondition {
    /// Matches on whichever parts are present. Neither part matches every row.
    Token {
        system: Option<String>,
        code: Option<String>,
    },
    /// Equality against the normalized stored text.
    String { value: String },
    /// Value comparison plus optional unit equality.
    Number {
        comparator: Comparator,
        value: Decimal,
        system: Option<String>,
        units: Option<String>,
    },
    /// Rows whose `[low, high]` lies within the given bounds.
    Date {
        lower: Option<DateTime<Utc>>,
        upper: Option<DateTime<Utc>>,
    },
    /// Rows pointing at the target id, optionally of a specific type.
    Reference {
        target_type: Option<String>,
        target_id: ResourceId,
    },
}

/// A disjunctive filter over the rows of one search parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPredicate {
    /// Owning resource type of matching rows.
    pub resource_type: String,
    /// The parameter whose rows are matched.
    pub param_name: String,
    /// Row discriminator, see [`column_kind_for`].
    pub column_kind: &'static str,
    /// ORed conditions. Never empty.
    pub conditions: Vec<RowCondition>,
    /// Restriction to previously surviving ids, when constrained.
    pub candidates: Option<BTreeSet<ResourceId>>,
}

/// Builds predicates from query values.
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Builds the predicate for one non-empty OR-group.
    pub fn build(
        resource_type: &str,
        def: &SearchParamDef,
        group: &[QueryValue],
        candidates: &CandidateSet,
    ) -> StorageResult<IndexPredicate> {
        let conditions = group
            .iter()
            .map(|value| Self::condition(def, value))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(IndexPredicate {
            resource_type: resource_type.to_string(),
            param_name: def.name.clone(),
            column_kind: column_kind_for(def.kind),
            conditions,
            candidates: candidates.ids().cloned(),
        })
    }

    /// Converts one query value, validating it against the definition.
    pub fn condition(def: &SearchParamDef, value: &QueryValue) -> StorageResult<RowCondition> {
        if !def.kind.accepts(value.kind()) {
            return Err(SchemaError::QueryValueMismatch {
                param_name: def.name.clone(),
                expected: def.kind,
                found: value.kind(),
            }
            .into());
        }

        let condition = match value {
            QueryValue::Token { system, code } => RowCondition::Token {
                system: system.clone(),
                code: code.clone(),
            },
            QueryValue::String { value } => RowCondition::String {
                value: normalize_string(value),
            },
            QueryValue::Number {
                value,
                comparator,
                system,
                units,
            } => {
                let prefix = comparator.unwrap_or_default();
                let comparator = Comparator::try_from(prefix).map_err(|prefix| {
                    SchemaError::UnsupportedComparator {
                        param_name: def.name.clone(),
                        kind: def.kind,
                        comparator: prefix.to_string(),
                    }
                })?;
                RowCondition::Number {
                    comparator,
                    value: value.normalize(),
                    system: system.clone(),
                    units: units.clone(),
                }
            }
            QueryValue::Date { lower: None, upper: None } => {
                return Err(SearchError::InvalidQueryValue {
                    param_name: def.name.clone(),
                    message: "a date value needs a lower or an upper bound".to_string(),
                }
                .into());
            }
            QueryValue::Date { lower, upper } => RowCondition::Date {
                lower: *lower,
                upper: *upper,
            },
            QueryValue::Reference { resource_type, id } => RowCondition::Reference {
                target_type: resource_type.clone(),
                target_id: *id,
            },
        };
        Ok(condition)
    }
}

/// Applies one OR-group to the running candidate set.
///
/// An empty group leaves the set unchanged. The result is always a subset
/// of a constrained input.
pub async fn match_group(
    session: &mut dyn ReadSession,
    resource_type: &str,
    def: &SearchParamDef,
    group: &[QueryValue],
    candidates: CandidateSet,
) -> StorageResult<CandidateSet> {
    if group.is_empty() || candidates.is_empty() {
        return Ok(candidates);
    }

    let predicate = PredicateBuilder::build(resource_type, def, group, &candidates)?;
    let matched = session.query_ids(&predicate).await?;
    let narrowed = candidates.narrow(matched);

    tracing::debug!(
        resource_type,
        param = %def.name,
        values = group.len(),
        remaining = narrowed.ids().map(|ids| ids.len()),
        "applied search predicate"
    );
    Ok(narrowed)
}
