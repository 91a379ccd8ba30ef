//! Stored resource types.
//!
//! This module defines the [`StoredResource`] record returned by the record
//! store, its internal [`ResourceId`], and the [`Tag`]s carried alongside it.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal identifier assigned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

impl ResourceId {
    /// Wraps a raw store identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw store identifier.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ResourceId)
    }
}

impl From<i64> for ResourceId {
    fn from(raw: i64) -> Self {
        ResourceId(raw)
    }
}

/// A tag attached to a resource (`meta.tag`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// The tag code.
    pub term: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The system the code belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl Tag {
    /// Creates a tag with only a term.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            label: None,
            scheme: None,
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Collects the tags listed under `meta.tag` of a resource body.
    ///
    /// Entries without a code are ignored.
    pub fn from_meta(content: &Value) -> Vec<Tag> {
        let Some(tags) = content
            .get("meta")
            .and_then(|m| m.get("tag"))
            .and_then(|t| t.as_array())
        else {
            return Vec::new();
        };

        tags.iter()
            .filter_map(|tag| {
                let term = tag.get("code")?.as_str()?.trim();
                if term.is_empty() {
                    return None;
                }
                Some(Tag {
                    term: term.to_string(),
                    label: tag
                        .get("display")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    scheme: tag
                        .get("system")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                })
            })
            .collect()
    }
}

/// A resource body with its persistence metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    id: ResourceId,
    resource_type: String,
    content: Value,
    version_id: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tags: Vec<Tag>,
}

impl StoredResource {
    /// Reassembles a record read back from a store.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: ResourceId,
        resource_type: impl Into<String>,
        content: Value,
        version_id: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        tags: Vec<Tag>,
    ) -> Self {
        Self {
            id,
            resource_type: resource_type.into(),
            content,
            version_id,
            created_at,
            updated_at,
            tags,
        }
    }

    /// Returns the internal identifier.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the resource body.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Consumes the record and returns the body.
    pub fn into_content(self) -> Value {
        self.content
    }

    /// Returns the version number, starting at 1.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    /// When the first version was stored.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When this version was stored.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Tags stored with this version.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the relative URL (`Type/id`).
    pub fn url(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }
}
