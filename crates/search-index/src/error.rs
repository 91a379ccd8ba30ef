//! Error types for the search index engine.
//!
//! Errors are grouped by category: resource state, schema/data consistency,
//! search request problems, and backend failures. Every fallible operation
//! returns [`StorageResult`].

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::ValueKind;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Schema and data consistency errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Search request errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns true if this error reports a schema violation or an unsupported
    /// comparator/value-kind combination.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, StorageError::Schema(_))
    }

    /// Returns true if retrying the same operation could succeed.
    ///
    /// Only transient backend conditions are retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Backend(
                BackendError::ConnectionFailed { .. } | BackendError::PoolExhausted { .. }
            )
        )
    }
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested resource was not found.
    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },

    /// The resource body cannot be stored under the requested type.
    #[error("invalid {resource_type} resource: {message}")]
    Invalid {
        resource_type: String,
        message: String,
    },

    /// A reference value carries an identifier that is not a stored resource id.
    #[error("invalid reference '{reference}' at {path}")]
    InvalidReference { reference: String, path: String },
}

/// Errors raised when data or queries disagree with the declared schema.
///
/// These are configuration defects and are never retryable.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A single-type path yielded a value of an unexpected kind.
    #[error(
        "schema violation at {path} ({resource_type}.{param_name}): expected {expected} value, found {found}"
    )]
    KindMismatch {
        resource_type: String,
        param_name: String,
        path: String,
        expected: ValueKind,
        found: String,
    },

    /// The comparator cannot be applied to the parameter's value kind.
    #[error("comparator '{comparator}' is not supported for {kind} parameter '{param_name}'")]
    UnsupportedComparator {
        param_name: String,
        kind: ValueKind,
        comparator: String,
    },

    /// A query value of one kind was supplied for a parameter of another.
    #[error("parameter '{param_name}' is declared as {expected} but received a {found} value")]
    QueryValueMismatch {
        param_name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A search parameter path names an element the resource schema does not declare.
    #[error("no element declared at path {path}")]
    UnknownElement { path: String },

    /// A reference could not be tied to exactly one registered resource type.
    #[error("cannot resolve target type of reference '{reference}' at {path}")]
    UnresolvedReferenceType { reference: String, path: String },

    /// The resource type has no schema.
    #[error("unknown resource type: {resource_type}")]
    UnknownResourceType { resource_type: String },

    /// A resource schema definition is malformed.
    #[error("invalid schema definition: {message}")]
    InvalidDefinition { message: String },
}

/// Errors related to search requests.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query references an undeclared search parameter.
    #[error("unknown search parameter '{param_name}' for {resource_type}")]
    UnknownParameter {
        resource_type: String,
        param_name: String,
    },

    /// A query value cannot be interpreted.
    #[error("invalid value for search parameter '{param_name}': {message}")]
    InvalidQueryValue { param_name: String, message: String },

    /// A query literal could not be parsed.
    #[error("malformed query value '{value}': {message}")]
    MalformedValue { value: String, message: String },
}

/// Errors originating from the record store backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stored data could not be decoded.
    #[error("corrupt stored data: {message}")]
    CorruptData { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for engine operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}
