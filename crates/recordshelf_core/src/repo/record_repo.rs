//! Document-backed record repository.
//!
//! # Responsibility
//! - Provide CRUD over one collection's `(id, document, image_url)` table.
//! - Run equality filters on document fields inside SQLite by extracting the
//!   field and casting it to the compared type, then confirm each candidate
//!   through the record's typed getter.
//!
//! # Invariants
//! - The document column is stored and returned verbatim; this layer never
//!   decodes documents on write paths.
//! - Filters never fail on null or malformed documents; such rows simply do
//!   not match.
//! - `update_record` overwrites the whole document (last writer wins).
//! - The SQL step never rejects a row the typed getter would accept.
//! - Documents are persisted with `JsonCodec`.

use crate::model::document::FieldValue;
use crate::model::record::{Collection, JsonRecord, RecordField, RecordId};
use crate::repo::{ensure_table_ready, push_pagination, RepoError, RepoResult};
use log::info;
use rust_decimal::Decimal;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const RECORD_COLUMNS: [&str; 3] = ["id", "document", "image_url"];

const NUMERIC_MATCH_SQL: &str =
    "CAST(json_extract(document, ?1) AS NUMERIC) = CAST(?2 AS NUMERIC)";

// Strings compare in SQL. Numbers and booleans are read as text by the typed
// getter in their JSON spelling, so they are left to the post-filter.
const TEXT_MATCH_SQL: &str = "CASE json_type(document, ?1)
                WHEN 'text' THEN json_extract(document, ?1) = ?2
                WHEN 'integer' THEN 1
                WHEN 'real' THEN 1
                WHEN 'true' THEN 1
                WHEN 'false' THEN 1
                ELSE 0
             END";

/// Pagination options for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for one collection of dynamic-schema records.
pub trait RecordRepository {
    /// Collection every record handled by this repository belongs to.
    fn collection(&self) -> Collection;
    /// Inserts an unsaved record and returns the generated key.
    fn create_record(&self, record: &JsonRecord) -> RepoResult<RecordId>;
    /// Overwrites document and image URL of an existing row.
    fn update_record(&self, record: &JsonRecord) -> RepoResult<()>;
    fn get_record(&self, id: RecordId) -> RepoResult<Option<JsonRecord>>;
    /// Lists records ordered by `id ASC`.
    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<JsonRecord>>;
    /// Deletes the whole row.
    fn delete_record(&self, id: RecordId) -> RepoResult<()>;
    /// Returns records whose document field equals `value` after type coercion.
    fn find_by_field(&self, field: RecordField, value: &FieldValue)
        -> RepoResult<Vec<JsonRecord>>;

    fn find_by_numeric_attribute(&self, value: Decimal) -> RepoResult<Vec<JsonRecord>> {
        self.find_by_field(RecordField::NumericAttribute, &FieldValue::Decimal(value))
    }

    fn find_by_weight(&self, value: Decimal) -> RepoResult<Vec<JsonRecord>> {
        self.find_by_field(RecordField::Weight, &FieldValue::Decimal(value))
    }

    fn find_by_secondary_attribute(&self, value: &str) -> RepoResult<Vec<JsonRecord>> {
        self.find_by_field(
            RecordField::SecondaryAttribute,
            &FieldValue::Text(value.to_string()),
        )
    }
}

/// SQLite-backed record repository bound to one collection.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
    collection: Collection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection, collection: Collection) -> RepoResult<Self> {
        ensure_table_ready(conn, collection.table(), &RECORD_COLUMNS)?;
        Ok(Self { conn, collection })
    }

    fn ensure_same_collection(&self, record: &JsonRecord) -> RepoResult<()> {
        if record.collection() != self.collection {
            return Err(RepoError::InvalidData(format!(
                "{} repository cannot store a {} record",
                self.collection.label(),
                record.collection().label()
            )));
        }
        Ok(())
    }

    fn query_records(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<JsonRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row, self.collection)?);
        }
        Ok(records)
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn collection(&self) -> Collection {
        self.collection
    }

    fn create_record(&self, record: &JsonRecord) -> RepoResult<RecordId> {
        self.ensure_same_collection(record)?;
        if let Some(id) = record.id() {
            return Err(RepoError::InvalidData(format!(
                "record already persisted with id {id}"
            )));
        }

        self.conn.execute(
            &format!(
                "INSERT INTO {} (document, image_url) VALUES (?1, ?2);",
                self.collection.table()
            ),
            params![record.raw_document(), record.image_url()],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            "event=record_create module=repo status=ok collection={} id={id}",
            self.collection.label()
        );
        Ok(id)
    }

    fn update_record(&self, record: &JsonRecord) -> RepoResult<()> {
        self.ensure_same_collection(record)?;
        let id = record
            .id()
            .ok_or_else(|| RepoError::InvalidData("cannot update unsaved record".to_string()))?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET document = ?1, image_url = ?2 WHERE id = ?3;",
                self.collection.table()
            ),
            params![record.raw_document(), record.image_url(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<JsonRecord>> {
        let sql = format!(
            "SELECT id, document, image_url FROM {} WHERE id = ?;",
            self.collection.table()
        );
        let mut records = self.query_records(&sql, vec![Value::Integer(id)])?;
        Ok(records.pop())
    }

    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<JsonRecord>> {
        let mut sql = format!(
            "SELECT id, document, image_url FROM {} ORDER BY id ASC",
            self.collection.table()
        );
        let mut bind_values = Vec::new();
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);
        self.query_records(&sql, bind_values)
    }

    fn delete_record(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", self.collection.table()),
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!(
            "event=record_delete module=repo status=ok collection={} id={id}",
            self.collection.label()
        );
        Ok(())
    }

    fn find_by_field(
        &self,
        field: RecordField,
        value: &FieldValue,
    ) -> RepoResult<Vec<JsonRecord>> {
        let key = self.collection.field_key(field).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "{} records have no {field:?} field",
                self.collection.label()
            ))
        })?;
        if value.kind() != field.kind() {
            return Err(RepoError::InvalidData(format!(
                "{field:?} expects {} values, got {}",
                field.kind(),
                value.kind()
            )));
        }

        let (predicate, bound) = match value {
            FieldValue::Decimal(decimal) => (NUMERIC_MATCH_SQL, decimal.to_string()),
            FieldValue::Text(text) => (TEXT_MATCH_SQL, text.clone()),
        };
        // CASE keeps json_extract and json_type away from rows json_valid rejects.
        let sql = format!(
            "SELECT id, document, image_url
             FROM {table}
             WHERE CASE WHEN json_valid(document) THEN {predicate} ELSE 0 END
             ORDER BY id ASC;",
            table = self.collection.table(),
        );
        let path = json_path(key);

        let candidates = self.query_records(&sql, vec![Value::Text(path), Value::Text(bound)])?;
        let records: Vec<JsonRecord> = candidates
            .into_iter()
            .filter(|record| record.get_field(field).as_ref() == Some(value))
            .collect();

        info!(
            "event=record_filter module=repo status=ok collection={} field={field:?} kind={} matches={}",
            self.collection.label(),
            field.kind(),
            records.len()
        );
        Ok(records)
    }
}

fn parse_record_row(row: &Row<'_>, collection: Collection) -> RepoResult<JsonRecord> {
    Ok(JsonRecord::from_row(
        row.get("id")?,
        collection,
        row.get("document")?,
        row.get("image_url")?,
    ))
}

fn json_path(key: &str) -> String {
    format!("$.\"{key}\"")
}
