//! Read sessions over a single pooled connection.

use std::collections::BTreeSet;

use async_trait::async_trait;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params_from_iter;

use crate::core::ReadSession;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::search::{CandidateSet, IndexPredicate};
use crate::types::{ResourceId, StoredResource};

use super::search::QueryBuilder;
use super::storage::RawRecord;

/// A deferred read transaction spanning one search.
///
/// The transaction is committed by [`finish`](ReadSession::finish) and
/// rolled back if the session is dropped first.
pub struct SqliteReadSession {
    conn: PooledConnection<SqliteConnectionManager>,
    builder: QueryBuilder,
    resource_type: String,
    active: bool,
}

impl SqliteReadSession {
    pub(crate) fn begin(
        conn: PooledConnection<SqliteConnectionManager>,
        resource_type: &str,
    ) -> StorageResult<Self> {
        conn.execute_batch("BEGIN DEFERRED")
            .map_err(|e| session_error("begin read transaction", e))?;

        Ok(Self {
            conn,
            builder: QueryBuilder::new(resource_type),
            resource_type: resource_type.to_string(),
            active: true,
        })
    }
}

#[async_trait]
impl ReadSession for SqliteReadSession {
    async fn query_ids(&mut self, predicate: &IndexPredicate) -> StorageResult<BTreeSet<ResourceId>> {
        let fragment = self.builder.build_id_query(predicate);
        tracing::trace!(sql = %fragment.sql, params = fragment.params.len(), "predicate query");

        let mut stmt = self
            .conn
            .prepare(&fragment.sql)
            .map_err(|e| session_error("prepare predicate query", e))?;

        let ids = stmt
            .query_map(params_from_iter(fragment.params.iter()), |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| session_error("run predicate query", e))?
            .map(|id| id.map(ResourceId::new))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| session_error("read predicate result", e))?;

        Ok(ids)
    }

    async fn load(&mut self, candidates: &CandidateSet) -> StorageResult<Vec<StoredResource>> {
        let fragment = self.builder.build_load_query(candidates);

        let mut stmt = self
            .conn
            .prepare(&fragment.sql)
            .map_err(|e| session_error("prepare load query", e))?;

        let raw = stmt
            .query_map(params_from_iter(fragment.params.iter()), RawRecord::from_row)
            .map_err(|e| session_error("load records", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| session_error("read record", e))?;

        raw.into_iter()
            .map(|record| record.into_stored(&self.resource_type))
            .collect()
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<()> {
        self.active = false;
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| session_error("commit read transaction", e))
    }
}

impl Drop for SqliteReadSession {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "failed to roll back read transaction");
            }
        }
    }
}

fn session_error(what: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message: format!("Failed to {}: {}", what, e),
        source: Some(Box::new(e)),
    })
}
