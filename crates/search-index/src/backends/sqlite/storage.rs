//! ResourceStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use crate::core::{ReadSession, ResourceStore};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::types::datetime::{from_index_text, to_index_text};
use crate::types::{IndexEntry, IndexRow, ResourceId, StoredResource, Tag};

use super::SqliteBackend;
use super::search::SqliteSearchIndexWriter;
use super::session::SqliteReadSession;

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn not_found(resource_type: &str, id: ResourceId) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        resource_type: resource_type.to_string(),
        id: id.to_string(),
    })
}

/// A `resources` or `resource_history` row before decoding.
pub(crate) struct RawRecord {
    id: i64,
    version_id: i64,
    data: Vec<u8>,
    tags: String,
    created_at: String,
    last_updated: String,
}

impl RawRecord {
    /// Reads the columns `id, version_id, data, tags, created_at, last_updated`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version_id: row.get(1)?,
            data: row.get(2)?,
            tags: row.get(3)?,
            created_at: row.get(4)?,
            last_updated: row.get(5)?,
        })
    }

    pub(crate) fn into_stored(self, resource_type: &str) -> StorageResult<StoredResource> {
        let content: Value = serde_json::from_slice(&self.data)
            .map_err(|e| serialization_error(format!("Failed to deserialize resource: {}", e)))?;
        let tags: Vec<Tag> = serde_json::from_str(&self.tags)
            .map_err(|e| serialization_error(format!("Failed to deserialize tags: {}", e)))?;

        Ok(StoredResource::from_storage(
            ResourceId::new(self.id),
            resource_type,
            content,
            self.version_id as u64,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.last_updated)?,
            tags,
        ))
    }
}

fn parse_timestamp(text: &str) -> StorageResult<DateTime<Utc>> {
    from_index_text(text).ok_or_else(|| {
        StorageError::Backend(BackendError::CorruptData {
            message: format!("bad timestamp '{}'", text),
        })
    })
}

/// Timestamps keep microsecond precision so they survive the text round trip.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn current_record(
    conn: &Connection,
    resource_type: &str,
    id: ResourceId,
) -> StorageResult<Option<RawRecord>> {
    conn.query_row(
        "SELECT id, version_id, data, tags, created_at, last_updated
         FROM resources WHERE resource_type = ?1 AND id = ?2",
        params![resource_type, id.as_i64()],
        RawRecord::from_row,
    )
    .optional()
    .map_err(|e| internal_error(format!("Failed to read resource: {}", e)))
}

/// Stamps the assigned id and type onto the body.
fn stamp(mut content: Value, resource_type: &str, id: ResourceId) -> Value {
    if let Some(obj) = content.as_object_mut() {
        obj.insert(
            "resourceType".to_string(),
            Value::String(resource_type.to_string()),
        );
        obj.insert("id".to_string(), Value::String(id.to_string()));
    }
    content
}

#[async_trait]
impl ResourceStore for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn persist_new(
        &self,
        resource_type: &str,
        content: Value,
        tags: Vec<Tag>,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<StoredResource> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let now = now();
        let timestamp = to_index_text(&now);
        let tags_json = serde_json::to_string(&tags)
            .map_err(|e| serialization_error(format!("Failed to serialize tags: {}", e)))?;

        // The id is assigned by the insert, so the body is written twice.
        tx.execute(
            "INSERT INTO resources (resource_type, version_id, data, tags, created_at, last_updated)
             VALUES (?1, 1, ?2, ?3, ?4, ?4)",
            params![resource_type, b"{}".to_vec(), tags_json, timestamp],
        )
        .map_err(|e| internal_error(format!("Failed to insert resource: {}", e)))?;
        let id = ResourceId::new(tx.last_insert_rowid());

        let content = stamp(content, resource_type, id);
        let data = serde_json::to_vec(&content)
            .map_err(|e| serialization_error(format!("Failed to serialize resource: {}", e)))?;
        tx.execute(
            "UPDATE resources SET data = ?1 WHERE id = ?2",
            params![data, id.as_i64()],
        )
        .map_err(|e| internal_error(format!("Failed to write resource body: {}", e)))?;

        let rows = SqliteSearchIndexWriter::insert_all(&tx, resource_type, id, &entries)?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::debug!(resource_type, %id, rows, "persisted new resource");

        Ok(StoredResource::from_storage(
            id,
            resource_type,
            content,
            1,
            now,
            now,
            tags,
        ))
    }

    async fn replace(
        &self,
        resource_type: &str,
        id: ResourceId,
        content: Value,
        tags: Vec<Tag>,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<StoredResource> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let existing =
            current_record(&tx, resource_type, id)?.ok_or_else(|| not_found(resource_type, id))?;

        tx.execute(
            "INSERT INTO resource_history
                (resource_id, resource_type, version_id, data, tags, created_at, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                existing.id,
                resource_type,
                existing.version_id,
                existing.data,
                existing.tags,
                existing.created_at,
                existing.last_updated
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert history: {}", e)))?;

        let version_id = existing.version_id + 1;
        let created_at = parse_timestamp(&existing.created_at)?;
        let now = now();
        let content = stamp(content, resource_type, id);
        let data = serde_json::to_vec(&content)
            .map_err(|e| serialization_error(format!("Failed to serialize resource: {}", e)))?;
        let tags_json = serde_json::to_string(&tags)
            .map_err(|e| serialization_error(format!("Failed to serialize tags: {}", e)))?;

        tx.execute(
            "UPDATE resources SET version_id = ?1, data = ?2, tags = ?3, last_updated = ?4
             WHERE resource_type = ?5 AND id = ?6",
            params![
                version_id,
                data,
                tags_json,
                to_index_text(&now),
                resource_type,
                id.as_i64()
            ],
        )
        .map_err(|e| internal_error(format!("Failed to update resource: {}", e)))?;

        let removed = SqliteSearchIndexWriter::delete_all(&tx, resource_type, id)?;
        let rows = SqliteSearchIndexWriter::insert_all(&tx, resource_type, id, &entries)?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::debug!(resource_type, %id, version_id, removed, rows, "replaced resource");

        Ok(StoredResource::from_storage(
            id,
            resource_type,
            content,
            version_id as u64,
            created_at,
            now,
            tags,
        ))
    }

    async fn find_by_id(&self, resource_type: &str, id: ResourceId) -> StorageResult<StoredResource> {
        let conn = self.get_connection()?;
        current_record(&conn, resource_type, id)?
            .ok_or_else(|| not_found(resource_type, id))?
            .into_stored(resource_type)
    }

    async fn history(
        &self,
        resource_type: &str,
        id: ResourceId,
    ) -> StorageResult<Vec<StoredResource>> {
        let conn = self.get_connection()?;
        let current =
            current_record(&conn, resource_type, id)?.ok_or_else(|| not_found(resource_type, id))?;

        let mut stmt = conn
            .prepare(
                "SELECT resource_id, version_id, data, tags, created_at, last_updated
                 FROM resource_history
                 WHERE resource_type = ?1 AND resource_id = ?2
                 ORDER BY version_id DESC",
            )
            .map_err(|e| internal_error(format!("Failed to prepare history query: {}", e)))?;

        let archived = stmt
            .query_map(params![resource_type, id.as_i64()], RawRecord::from_row)
            .map_err(|e| internal_error(format!("Failed to query history: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read history row: {}", e)))?;

        std::iter::once(current)
            .chain(archived)
            .map(|record| record.into_stored(resource_type))
            .collect()
    }

    async fn index_rows(&self, resource_type: &str, id: ResourceId) -> StorageResult<Vec<IndexRow>> {
        let conn = self.get_connection()?;
        SqliteSearchIndexWriter::read_all(&conn, resource_type, id)
    }

    async fn list_ids(&self, resource_type: &str) -> StorageResult<Vec<ResourceId>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare("SELECT id FROM resources WHERE resource_type = ?1 ORDER BY id")
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;

        let ids = stmt
            .query_map([resource_type], |row| row.get::<_, i64>(0))
            .map_err(|e| internal_error(format!("Failed to list resources: {}", e)))?
            .map(|id| id.map(ResourceId::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read resource id: {}", e)))?;

        Ok(ids)
    }

    async fn replace_index(
        &self,
        resource_type: &str,
        id: ResourceId,
        entries: Vec<IndexEntry>,
    ) -> StorageResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        if current_record(&tx, resource_type, id)?.is_none() {
            return Err(not_found(resource_type, id));
        }

        SqliteSearchIndexWriter::delete_all(&tx, resource_type, id)?;
        SqliteSearchIndexWriter::insert_all(&tx, resource_type, id, &entries)?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit transaction: {}", e)))
    }

    async fn begin_read(&self, resource_type: &str) -> StorageResult<Box<dyn ReadSession>> {
        let conn = self.get_connection()?;
        Ok(Box::new(SqliteReadSession::begin(conn, resource_type)?))
    }
}
