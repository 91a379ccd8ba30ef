//! Search coordination.
//!
//! Resolves each query parameter to its definition, applies the OR-groups in
//! order against a single read session, and loads the surviving records.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::UnknownParameterPolicy;
use crate::core::ReadSession;
use crate::error::{SearchError, StorageResult};
use crate::schema::{SearchParamDef, SearchParameterRegistry};
use crate::types::{QueryValue, SearchQuery, StoredResource};

use super::predicate::{CandidateSet, match_group};

/// Drives AND-of-OR composition for one resource type.
pub struct SearchCoordinator {
    registry: Arc<RwLock<SearchParameterRegistry>>,
    unknown_parameters: UnknownParameterPolicy,
}

impl SearchCoordinator {
    /// Creates a coordinator.
    pub fn new(
        registry: Arc<RwLock<SearchParameterRegistry>>,
        unknown_parameters: UnknownParameterPolicy,
    ) -> Self {
        Self {
            registry,
            unknown_parameters,
        }
    }

    /// Computes the final candidate set for a query.
    ///
    /// Every parameter is resolved before any predicate runs, so an unknown
    /// parameter is reported regardless of what the others match. Returns as
    /// soon as any group narrows the set to empty.
    pub async fn candidates(
        &self,
        session: &mut dyn ReadSession,
        resource_type: &str,
        query: &SearchQuery,
    ) -> StorageResult<CandidateSet> {
        let resolved = self.resolve(resource_type, query)?;

        let mut candidates = CandidateSet::Unconstrained;
        for (name, def, groups) in resolved {
            for group in groups {
                candidates = match_group(session, resource_type, &def, group, candidates).await?;
                if candidates.is_empty() {
                    tracing::debug!(resource_type, param = name, "search narrowed to empty");
                    return Ok(candidates);
                }
            }
        }

        Ok(candidates)
    }

    /// Looks up the definition of each query parameter, applying the
    /// unknown-parameter policy.
    fn resolve<'q>(
        &self,
        resource_type: &str,
        query: &'q SearchQuery,
    ) -> StorageResult<Vec<(&'q str, Arc<SearchParamDef>, &'q [Vec<QueryValue>])>> {
        let registry = self.registry.read();
        let mut resolved = Vec::new();

        for (name, groups) in query.parameters() {
            match registry.get_param(resource_type, name) {
                Some(def) => resolved.push((name, def, groups)),
                None => match self.unknown_parameters {
                    UnknownParameterPolicy::Reject => {
                        return Err(SearchError::UnknownParameter {
                            resource_type: resource_type.to_string(),
                            param_name: name.to_string(),
                        }
                        .into());
                    }
                    UnknownParameterPolicy::Ignore => {
                        tracing::warn!(resource_type, param = name, "ignoring unknown search parameter");
                    }
                },
            }
        }

        Ok(resolved)
    }

    /// Runs a query and loads the matching records, ordered by id.
    ///
    /// An empty query, or one whose parameters were all ignored, returns
    /// every record of the type.
    pub async fn search(
        &self,
        mut session: Box<dyn ReadSession>,
        resource_type: &str,
        query: &SearchQuery,
    ) -> StorageResult<Vec<StoredResource>> {
        let candidates = self
            .candidates(session.as_mut(), resource_type, query)
            .await?;

        let results = if candidates.is_empty() {
            Vec::new()
        } else {
            session.load(&candidates).await?
        };
        session.finish().await?;

        tracing::debug!(resource_type, results = results.len(), "search complete");
        Ok(results)
    }
}
