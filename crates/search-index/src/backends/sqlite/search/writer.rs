//! SQLite search index writer.
//!
//! Maps [`IndexEntry`] values onto the typed columns of `search_index` and
//! back.

use std::str::FromStr;

use rusqlite::{Connection, Row, params, params_from_iter};
use rust_decimal::Decimal;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::datetime::{from_index_text, to_index_text};
use crate::types::{IndexEntry, IndexRow, IndexValue, ResourceId};

use super::parameter_handlers::decimal_index_key;
use super::query_builder::SqlParam;

/// Column order shared by the insert statement and [`SqliteSearchIndexWriter::to_sql_params`].
const INSERT_SQL: &str = "INSERT INTO search_index (
        resource_type, resource_id, param_name, value_kind,
        value_string, value_token_system, value_token_code,
        value_number_key, value_number_text, value_number_system, value_number_units,
        value_date_low, value_date_high,
        reference_path, reference_type, reference_target
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

const SELECT_SQL: &str = "SELECT param_name, value_kind,
        value_string, value_token_system, value_token_code,
        value_number_text, value_number_system, value_number_units,
        value_date_low, value_date_high,
        reference_path, reference_type, reference_target
    FROM search_index WHERE resource_type = ?1 AND resource_id = ?2";

/// Writes and reads index rows.
pub struct SqliteSearchIndexWriter;

impl SqliteSearchIndexWriter {
    /// Inserts every entry for the owner.
    pub fn insert_all(
        conn: &Connection,
        resource_type: &str,
        resource_id: ResourceId,
        entries: &[IndexEntry],
    ) -> StorageResult<usize> {
        let mut stmt = conn
            .prepare_cached(INSERT_SQL)
            .map_err(|e| internal_error(format!("Failed to prepare index insert: {}", e)))?;

        for entry in entries {
            let params = Self::to_sql_params(resource_type, resource_id, entry);
            stmt.execute(params_from_iter(params.iter()))
                .map_err(|e| internal_error(format!("Failed to insert index row: {}", e)))?;
        }
        Ok(entries.len())
    }

    /// Removes every row owned by the resource.
    pub fn delete_all(conn: &Connection, resource_type: &str, resource_id: ResourceId) -> StorageResult<usize> {
        conn.execute(
            "DELETE FROM search_index WHERE resource_type = ?1 AND resource_id = ?2",
            params![resource_type, resource_id.as_i64()],
        )
        .map_err(|e| internal_error(format!("Failed to delete index rows: {}", e)))
    }

    /// Reads the rows owned by a resource in canonical order.
    pub fn read_all(
        conn: &Connection,
        resource_type: &str,
        resource_id: ResourceId,
    ) -> StorageResult<Vec<IndexRow>> {
        let mut stmt = conn
            .prepare_cached(SELECT_SQL)
            .map_err(|e| internal_error(format!("Failed to prepare index read: {}", e)))?;

        let entries = stmt
            .query_map(params![resource_type, resource_id.as_i64()], Self::read_columns)
            .map_err(|e| internal_error(format!("Failed to read index rows: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read index row: {}", e)))?;

        let mut rows = entries
            .into_iter()
            .map(|columns| {
                Ok(IndexRow {
                    resource_type: resource_type.to_string(),
                    resource_id,
                    entry: columns.into_entry()?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        rows.sort();
        Ok(rows)
    }

    /// Converts an entry to the insert statement's parameters.
    pub fn to_sql_params(resource_type: &str, resource_id: ResourceId, entry: &IndexEntry) -> Vec<SqlParam> {
        let mut params = vec![
            SqlParam::string(resource_type),
            SqlParam::integer(resource_id.as_i64()),
            SqlParam::string(&entry.param_name),
            SqlParam::string(entry.value.column_kind()),
        ];
        // Twelve value columns, null unless the kind populates them.
        let mut values = vec![SqlParam::Null; 12];

        match &entry.value {
            IndexValue::String { value } => {
                values[0] = SqlParam::string(value);
            }
            IndexValue::Token { system, code } => {
                values[1] = SqlParam::opt_string(system.as_deref());
                values[2] = SqlParam::opt_string(code.as_deref());
            }
            IndexValue::Number {
                value,
                system,
                units,
            } => {
                values[3] = SqlParam::string(decimal_index_key(value));
                values[4] = SqlParam::string(value.to_string());
                values[5] = SqlParam::opt_string(system.as_deref());
                values[6] = SqlParam::opt_string(units.as_deref());
            }
            IndexValue::Date { low, high } => {
                values[7] = SqlParam::string(to_index_text(low));
                values[8] = SqlParam::string(to_index_text(high));
            }
            IndexValue::Reference {
                path,
                target_type,
                target_id,
            } => {
                values[9] = SqlParam::string(path);
                values[10] = SqlParam::string(target_type);
                values[11] = SqlParam::integer(target_id.as_i64());
            }
        }

        params.extend(values);
        params
    }

    fn read_columns(row: &Row<'_>) -> rusqlite::Result<StoredColumns> {
        Ok(StoredColumns {
            param_name: row.get(0)?,
            value_kind: row.get(1)?,
            string: row.get(2)?,
            token_system: row.get(3)?,
            token_code: row.get(4)?,
            number_text: row.get(5)?,
            number_system: row.get(6)?,
            number_units: row.get(7)?,
            date_low: row.get(8)?,
            date_high: row.get(9)?,
            reference_path: row.get(10)?,
            reference_type: row.get(11)?,
            reference_target: row.get(12)?,
        })
    }
}

struct StoredColumns {
    param_name: String,
    value_kind: String,
    string: Option<String>,
    token_system: Option<String>,
    token_code: Option<String>,
    number_text: Option<String>,
    number_system: Option<String>,
    number_units: Option<String>,
    date_low: Option<String>,
    date_high: Option<String>,
    reference_path: Option<String>,
    reference_type: Option<String>,
    reference_target: Option<i64>,
}

impl StoredColumns {
    fn into_entry(self) -> StorageResult<IndexEntry> {
        let value = match self.value_kind.as_str() {
            "string" => IndexValue::String {
                value: required(self.string, "value_string")?,
            },
            "token" => IndexValue::Token {
                system: self.token_system,
                code: self.token_code,
            },
            "number" => {
                let text = required(self.number_text, "value_number_text")?;
                IndexValue::Number {
                    value: Decimal::from_str(&text)
                        .map_err(|e| corrupt(format!("bad number '{}': {}", text, e)))?,
                    system: self.number_system,
                    units: self.number_units,
                }
            }
            "date" => IndexValue::Date {
                low: date(required(self.date_low, "value_date_low")?)?,
                high: date(required(self.date_high, "value_date_high")?)?,
            },
            "reference" => IndexValue::Reference {
                path: required(self.reference_path, "reference_path")?,
                target_type: required(self.reference_type, "reference_type")?,
                target_id: ResourceId::new(required(self.reference_target, "reference_target")?),
            },
            other => return Err(corrupt(format!("unknown index row kind '{}'", other))),
        };
        Ok(IndexEntry::new(self.param_name, value))
    }
}

fn required<T>(value: Option<T>, column: &str) -> StorageResult<T> {
    value.ok_or_else(|| corrupt(format!("missing {}", column)))
}

fn date(text: String) -> StorageResult<chrono::DateTime<chrono::Utc>> {
    from_index_text(&text).ok_or_else(|| corrupt(format!("bad date '{}'", text)))
}

fn corrupt(message: String) -> StorageError {
    StorageError::Backend(BackendError::CorruptData { message })
}

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::schema::initialize_schema;
    use crate::types::datetime::parse_instant;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO resources (id, resource_type, version_id, data, created_at, last_updated)
             VALUES (1, 'Observation', 1, '{}', 'x', 'x')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_token_params() {
        let entry = IndexEntry::new(
            "code",
            IndexValue::Token {
                system: Some("http://loinc.org".to_string()),
                code: Some("1234-5".to_string()),
            },
        );

        let params = SqliteSearchIndexWriter::to_sql_params("Observation", ResourceId::new(1), &entry);

        assert_eq!(params.len(), 16);
        assert_eq!(params[3], SqlParam::string("token"));
        assert_eq!(params[5], SqlParam::string("http://loinc.org"));
        assert_eq!(params[6], SqlParam::string("1234-5"));
        assert_eq!(params[4], SqlParam::Null);
    }

    #[test]
    fn test_rows_read_back_as_written() {
        let conn = setup();
        let instant = parse_instant("2020-01-01T00:00:00Z").unwrap();
        let entries = vec![
            IndexEntry::new(
                "value-quantity",
                IndexValue::Number {
                    value: Decimal::new(54, 1),
                    system: None,
                    units: Some("mg".to_string()),
                },
            ),
            IndexEntry::new(
                "date",
                IndexValue::Date {
                    low: instant,
                    high: instant,
                },
            ),
            IndexEntry::new(
                "subject",
                IndexValue::Reference {
                    path: "Observation.subject".to_string(),
                    target_type: "Observation".to_string(),
                    target_id: ResourceId::new(1),
                },
            ),
        ];

        SqliteSearchIndexWriter::insert_all(&conn, "Observation", ResourceId::new(1), &entries).unwrap();
        let rows = SqliteSearchIndexWriter::read_all(&conn, "Observation", ResourceId::new(1)).unwrap();

        let mut expected = entries.clone();
        expected.sort();
        let read: Vec<_> = rows.into_iter().map(|r| r.entry).collect();
        assert_eq!(read, expected);
    }

    #[test]
    fn test_delete_all() {
        let conn = setup();
        let entry = IndexEntry::new(
            "status",
            IndexValue::Token {
                system: None,
                code: Some("final".to_string()),
            },
        );
        SqliteSearchIndexWriter::insert_all(&conn, "Observation", ResourceId::new(1), &[entry]).unwrap();

        let deleted = SqliteSearchIndexWriter::delete_all(&conn, "Observation", ResourceId::new(1)).unwrap();
        assert_eq!(deleted, 1);
        assert!(
            SqliteSearchIndexWriter::read_all(&conn, "Observation", ResourceId::new(1))
                .unwrap()
                .is_empty()
        );
    }
}
