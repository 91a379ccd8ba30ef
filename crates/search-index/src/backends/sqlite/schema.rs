//! SQLite schema definitions.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::info!(version = SCHEMA_VERSION, "initialized sqlite schema");
    } else if current_version > SCHEMA_VERSION {
        return Err(StorageError::Backend(BackendError::MigrationError {
            message: format!(
                "database schema version {} is newer than supported version {}",
                current_version, SCHEMA_VERSION
            ),
        }));
    }

    Ok(())
}

fn schema_error(what: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message: format!("Failed to {}: {}", what, e),
        source: Some(Box::new(e)),
    })
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| schema_error("clear schema_version", e))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| schema_error("set schema_version", e))?;
    Ok(())
}

fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    // Ids are assigned by the database and shared across resource types.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_type TEXT NOT NULL,
            version_id INTEGER NOT NULL,
            data BLOB NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("create resources table", e))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS resource_history (
            resource_id INTEGER NOT NULL,
            resource_type TEXT NOT NULL,
            version_id INTEGER NOT NULL,
            data BLOB NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL,
            PRIMARY KEY (resource_id, version_id),
            FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE
        )",
        [],
    )
    .map_err(|e| schema_error("create resource_history table", e))?;

    // One row per extracted value; value_kind selects the populated columns.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS search_index (
            resource_type TEXT NOT NULL,
            resource_id INTEGER NOT NULL,
            param_name TEXT NOT NULL,
            value_kind TEXT NOT NULL,
            value_string TEXT,
            value_token_system TEXT,
            value_token_code TEXT,
            value_number_key TEXT,
            value_number_text TEXT,
            value_number_system TEXT,
            value_number_units TEXT,
            value_date_low TEXT,
            value_date_high TEXT,
            reference_path TEXT,
            reference_type TEXT,
            reference_target INTEGER,
            FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE,
            FOREIGN KEY (reference_target) REFERENCES resources(id)
        )",
        [],
    )
    .map_err(|e| schema_error("create search_index table", e))?;

    create_indexes(conn)
}

fn create_indexes(conn: &Connection) -> StorageResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_resources_type ON resources(resource_type, id)",
        "CREATE INDEX IF NOT EXISTS idx_search_string ON search_index(resource_type, param_name, value_string)",
        "CREATE INDEX IF NOT EXISTS idx_search_token ON search_index(resource_type, param_name, value_token_code, value_token_system)",
        "CREATE INDEX IF NOT EXISTS idx_search_number ON search_index(resource_type, param_name, value_number_key)",
        "CREATE INDEX IF NOT EXISTS idx_search_date ON search_index(resource_type, param_name, value_date_low, value_date_high)",
        "CREATE INDEX IF NOT EXISTS idx_search_reference ON search_index(resource_type, param_name, reference_target)",
        "CREATE INDEX IF NOT EXISTS idx_search_resource ON search_index(resource_id)",
    ];

    for index_sql in &indexes {
        conn.execute(index_sql, [])
            .map_err(|e| schema_error("create index", e))?;
    }

    Ok(())
}
