//! Engine configuration.

use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlite")]
use crate::backends::sqlite::SqliteBackendConfig;
use crate::error::StorageResult;

/// What to do when a query names a parameter the resource type does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownParameterPolicy {
    /// Fail the search with `SearchError::UnknownParameter`.
    #[default]
    Reject,
    /// Skip the parameter; it contributes nothing to the result.
    Ignore,
}

/// Configuration for a [`SearchEngine`](crate::engine::SearchEngine).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Handling of undeclared search parameters.
    #[serde(default)]
    pub unknown_parameters: UnknownParameterPolicy,

    /// SQLite record store settings.
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub sqlite: SqliteBackendConfig,
}

impl EngineConfig {
    /// Parses a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the unknown-parameter policy.
    pub fn with_unknown_parameters(mut self, policy: UnknownParameterPolicy) -> Self {
        self.unknown_parameters = policy;
        self
    }
}
