//! SQL query builder for index predicates.
//!
//! Translates an [`IndexPredicate`] into a statement selecting the owning
//! ids of matching `search_index` rows, and a [`CandidateSet`] into the
//! statement loading the surviving records.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};

use crate::search::{CandidateSet, IndexPredicate, RowCondition};
use crate::types::ResourceId;

use super::parameter_handlers::{
    DateHandler, NumberHandler, ReferenceHandler, StringHandler, TokenHandler,
};

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates a string parameter, or null.
    pub fn opt_string(s: Option<&str>) -> Self {
        s.map_or(SqlParam::Null, SqlParam::string)
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlParam::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            SqlParam::Null => ToSqlOutput::Owned(SqliteValue::Null),
        })
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Adds a parameter placeholder and returns the placeholder string.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Combines with another fragment using AND.
    pub fn and(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("({}) AND ({})", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Combines with another fragment using OR.
    pub fn or(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("({}) OR ({})", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Builds SQL statements for one resource type.
pub struct QueryBuilder {
    resource_type: String,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
        }
    }

    /// Builds the id query for a predicate.
    ///
    /// `?1`..`?3` bind the resource type, parameter name and row kind; the
    /// conditions follow.
    pub fn build_id_query(&self, predicate: &IndexPredicate) -> SqlFragment {
        let mut base = SqlFragment::with_params(
            "SELECT DISTINCT resource_id FROM search_index \
             WHERE resource_type = ?1 AND param_name = ?2 AND value_kind = ?3",
            vec![
                SqlParam::string(&self.resource_type),
                SqlParam::string(&predicate.param_name),
                SqlParam::string(predicate.column_kind),
            ],
        );

        let mut combined = SqlFragment::new("");
        for condition in &predicate.conditions {
            let offset = base.params.len() + combined.params.len();
            combined = combined.or(Self::build_condition(condition, offset));
        }

        if !combined.is_empty() {
            base.sql = format!("{} AND ({})", base.sql, combined.sql);
            base.params.extend(combined.params);
        }

        if let Some(ids) = &predicate.candidates {
            base.sql = format!("{} AND resource_id IN ({})", base.sql, id_list(ids));
        }

        base.sql.push_str(" ORDER BY resource_id");
        base
    }

    /// Builds the statement loading the records in a candidate set.
    pub fn build_load_query(&self, candidates: &CandidateSet) -> SqlFragment {
        let mut fragment = SqlFragment::with_params(
            "SELECT id, version_id, data, tags, created_at, last_updated \
             FROM resources WHERE resource_type = ?1",
            vec![SqlParam::string(&self.resource_type)],
        );

        if let Some(ids) = candidates.ids() {
            fragment.sql = format!("{} AND id IN ({})", fragment.sql, id_list(ids));
        }

        fragment.sql.push_str(" ORDER BY id");
        fragment
    }

    /// Builds the SQL for one row condition.
    pub fn build_condition(condition: &RowCondition, param_offset: usize) -> SqlFragment {
        match condition {
            RowCondition::Token { system, code } => {
                TokenHandler::build_sql(system.as_deref(), code.as_deref(), param_offset)
            }
            RowCondition::String { value } => StringHandler::build_sql(value, param_offset),
            RowCondition::Number {
                comparator,
                value,
                system,
                units,
            } => NumberHandler::build_sql(
                *comparator,
                value,
                system.as_deref(),
                units.as_deref(),
                param_offset,
            ),
            RowCondition::Date { lower, upper } => {
                DateHandler::build_sql(lower.as_ref(), upper.as_ref(), param_offset)
            }
            RowCondition::Reference {
                target_type,
                target_id,
            } => ReferenceHandler::build_sql(target_type.as_deref(), *target_id, param_offset),
        }
    }
}

/// Ids are integers, so they are inlined rather than bound.
fn id_list<'a>(ids: impl IntoIterator<Item = &'a ResourceId>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
