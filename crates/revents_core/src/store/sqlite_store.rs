//! SQLite adapter for the `DocumentStore` contract.
//!
//! # Responsibility
//! - Persist JSON document bodies in `documents` keyed by collection + id.
//! - Persist append-only lists in `list_entries`, ordered by insertion.
//! - Map queries onto `json_extract` filters/ordering.
//!
//! # Invariants
//! - Read-modify-write paths (`update`, transactions, batches) run inside an
//!   `IMMEDIATE` transaction so concurrent writers are serialized.
//! - Ordered queries skip documents that lack the order field.
//! - Read paths reject stored bodies that are not JSON objects.

use super::batch::{WriteBatch, WriteOp};
use super::field_path::{apply_updates, FieldUpdate};
use super::query::{Direction, Query};
use super::{
    json_type_name, DocRef, Document, DocumentSnapshot, DocumentStore, ListEntry, StoreError,
    StoreResult, TransactionOps,
};
use log::{debug, warn};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use serde_json::Value;
use uuid::Uuid;

const REQUIRED_TABLES: [&str; 2] = ["documents", "list_entries"];

/// Document store backed by one migrated SQLite connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    max_batch_writes: Option<usize>,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `StoreError::MissingRequiredTable` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }
        Ok(Self {
            conn,
            max_batch_writes: None,
        })
    }

    /// Rejects batches with more than `max` writes. Unlimited by default.
    #[must_use]
    pub fn with_max_batch_writes(mut self, max: usize) -> Self {
        self.max_batch_writes = Some(max);
        self
    }

    fn begin(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn add(&self, collection: &str, data: Document) -> StoreResult<DocRef> {
        let reference = DocRef::new(collection, Uuid::new_v4().simple().to_string());
        validate_reference(&reference)?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3);",
            params![
                reference.collection(),
                reference.id(),
                encode_body(&data)?
            ],
        )?;
        Ok(reference)
    }

    fn get(&self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>> {
        load_document(self.conn, reference)
    }

    fn set(&self, reference: &DocRef, data: Document) -> StoreResult<()> {
        write_document(self.conn, reference, &data)
    }

    fn update(&self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()> {
        let tx = self.begin()?;
        update_document(&tx, reference, updates)?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, reference: &DocRef) -> StoreResult<()> {
        remove_document(self.conn, reference)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        run_query(self.conn, query)
    }

    fn run_transaction<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn TransactionOps) -> StoreResult<T>,
    {
        let tx = self.begin()?;
        let mut ops = SqliteTransactionOps {
            conn: &tx,
            has_written: false,
        };
        match operation(&mut ops) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!("event=store_transaction module=store status=rollback error={err}");
                Err(err)
            }
        }
    }

    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        if let Some(max) = self.max_batch_writes.filter(|max| batch.len() > *max) {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                max,
            });
        }

        let writes = batch.len();
        let tx = self.begin()?;
        for op in batch.into_ops() {
            let applied = match &op {
                WriteOp::Set(reference, data) => write_document(&tx, reference, data),
                WriteOp::Update(reference, updates) => update_document(&tx, reference, updates),
                WriteOp::Delete(reference) => remove_document(&tx, reference),
            };
            if let Err(err) = applied {
                warn!(
                    "event=store_batch module=store status=rollback writes={writes} error={err}"
                );
                return Err(err);
            }
        }
        tx.commit()?;
        debug!("event=store_batch module=store status=ok writes={writes}");
        Ok(())
    }

    fn push(&self, list: &str, data: Document) -> StoreResult<String> {
        if list.trim().is_empty() {
            return Err(StoreError::InvalidData("list path must not be empty".to_string()));
        }
        let key = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO list_entries (list_path, entry_key, data) VALUES (?1, ?2, ?3);",
            params![list, key.as_str(), encode_body(&data)?],
        )?;
        Ok(key)
    }

    fn list(&self, list: &str) -> StoreResult<Vec<ListEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_key, data
             FROM list_entries
             WHERE list_path = ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([list])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get("entry_key")?;
            let text: String = row.get("data")?;
            let data = decode_body(&text, &format!("{list}/{key}"))?;
            entries.push(ListEntry { key, data });
        }
        Ok(entries)
    }
}

struct SqliteTransactionOps<'tx> {
    conn: &'tx Connection,
    has_written: bool,
}

impl TransactionOps for SqliteTransactionOps<'_> {
    fn get(&mut self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>> {
        if self.has_written {
            return Err(StoreError::ReadAfterWrite);
        }
        load_document(self.conn, reference)
    }

    fn set(&mut self, reference: &DocRef, data: Document) -> StoreResult<()> {
        self.has_written = true;
        write_document(self.conn, reference, &data)
    }

    fn update(&mut self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()> {
        self.has_written = true;
        update_document(self.conn, reference, updates)
    }

    fn delete(&mut self, reference: &DocRef) -> StoreResult<()> {
        self.has_written = true;
        remove_document(self.conn, reference)
    }
}

fn load_document(conn: &Connection, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT data
         FROM documents
         WHERE collection = ?1
           AND doc_id = ?2;",
    )?;
    let mut rows = stmt.query(params![reference.collection(), reference.id()])?;
    if let Some(row) = rows.next()? {
        let text: String = row.get("data")?;
        return Ok(Some(DocumentSnapshot {
            reference: reference.clone(),
            data: decode_body(&text, &reference.to_string())?,
        }));
    }
    Ok(None)
}

fn write_document(conn: &Connection, reference: &DocRef, data: &Document) -> StoreResult<()> {
    validate_reference(reference)?;
    conn.execute(
        "INSERT INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3)
         ON CONFLICT (collection, doc_id) DO UPDATE SET
            data = excluded.data,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![reference.collection(), reference.id(), encode_body(data)?],
    )?;
    Ok(())
}

fn update_document(
    conn: &Connection,
    reference: &DocRef,
    updates: &[FieldUpdate],
) -> StoreResult<()> {
    let Some(mut snapshot) = load_document(conn, reference)? else {
        return Err(StoreError::NotFound(reference.clone()));
    };
    apply_updates(&mut snapshot.data, updates);
    conn.execute(
        "UPDATE documents
         SET
            data = ?3,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE collection = ?1
           AND doc_id = ?2;",
        params![
            reference.collection(),
            reference.id(),
            encode_body(&snapshot.data)?
        ],
    )?;
    Ok(())
}

fn remove_document(conn: &Connection, reference: &DocRef) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
        params![reference.collection(), reference.id()],
    )?;
    Ok(())
}

fn run_query(conn: &Connection, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
    let mut sql = String::from("SELECT doc_id, data FROM documents WHERE collection = ?");
    let mut bind_values: Vec<SqlValue> = vec![SqlValue::Text(query.collection.clone())];

    for filter in &query.filters {
        sql.push_str(&format!(" AND json_extract(data, ?) {} ?", filter.op.sql()));
        bind_values.push(SqlValue::Text(filter.field.json_path()));
        bind_values.push(to_sql_value(&filter.value));
    }

    if let Some(order) = &query.order_by {
        sql.push_str(" AND json_extract(data, ?) IS NOT NULL");
        bind_values.push(SqlValue::Text(order.field.json_path()));
    }

    if let Some(cursor) = &query.start_after {
        match (&query.order_by, &cursor.order_value) {
            (Some(order), Some(order_value)) => {
                let comparison = match order.direction {
                    Direction::Asc => ">",
                    Direction::Desc => "<",
                };
                let path = order.field.json_path();
                sql.push_str(&format!(
                    " AND (json_extract(data, ?) {comparison} ?
                       OR (json_extract(data, ?) IS ? AND doc_id > ?))"
                ));
                bind_values.push(SqlValue::Text(path.clone()));
                bind_values.push(to_sql_value(order_value));
                bind_values.push(SqlValue::Text(path));
                bind_values.push(to_sql_value(order_value));
                bind_values.push(SqlValue::Text(cursor.doc_id.clone()));
            }
            _ => {
                sql.push_str(" AND doc_id > ?");
                bind_values.push(SqlValue::Text(cursor.doc_id.clone()));
            }
        }
    }

    match &query.order_by {
        Some(order) => {
            let direction = match order.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            sql.push_str(&format!(
                " ORDER BY json_extract(data, ?) {direction}, doc_id ASC"
            ));
            bind_values.push(SqlValue::Text(order.field.json_path()));
        }
        None => sql.push_str(" ORDER BY doc_id ASC"),
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(SqlValue::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut snapshots = Vec::new();
    while let Some(row) = rows.next()? {
        let doc_id: String = row.get("doc_id")?;
        let text: String = row.get("data")?;
        let reference = DocRef::new(query.collection.as_str(), doc_id);
        let data = decode_body(&text, &reference.to_string())?;
        snapshots.push(DocumentSnapshot { reference, data });
    }
    Ok(snapshots)
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn encode_body(data: &Document) -> StoreResult<String> {
    Ok(serde_json::to_string(data)?)
}

fn decode_body(text: &str, location: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidData(format!(
            "stored body at `{location}` is a {}, expected an object",
            json_type_name(&other)
        ))),
        Err(err) => Err(StoreError::InvalidData(format!(
            "stored body at `{location}` is not valid JSON: {err}"
        ))),
    }
}

fn validate_reference(reference: &DocRef) -> StoreResult<()> {
    if reference.collection().trim().is_empty() {
        return Err(StoreError::InvalidData(
            "collection path must not be empty".to_string(),
        ));
    }
    if reference.id().trim().is_empty() || reference.id().contains('/') {
        return Err(StoreError::InvalidData(format!(
            "invalid document id `{}`",
            reference.id()
        )));
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
