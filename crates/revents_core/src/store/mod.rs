//! Document store contract consumed by the domain services.
//!
//! # Responsibility
//! - Define the collection/document API the services talk to: CRUD, field
//!   updates with a delete sentinel, compound queries with cursors,
//!   read-then-write transactions, atomic batches and append-only lists.
//! - Keep storage adapters (`SqliteDocumentStore`) behind one trait.
//!
//! # Invariants
//! - Document bodies are JSON objects; ids live in `DocRef`, never in the body.
//! - `update` on a missing document fails with `StoreError::NotFound`.
//! - `delete` on a missing document is a no-op.
//! - A committed `WriteBatch` applies all of its writes or none of them.

use crate::db::DbError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod batch;
mod field_path;
mod query;
mod sqlite_store;

pub use batch::{WriteBatch, WriteOp};
pub use field_path::{apply_updates, FieldPath, FieldUpdate, FieldValue};
pub use query::{Direction, Filter, FilterOp, OrderBy, PageCursor, Query};
pub use sqlite_store::SqliteDocumentStore;

/// JSON object body of one stored document.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by document store adapters.
#[derive(Debug)]
pub enum StoreError {
    /// Storage transport failure.
    Db(DbError),
    /// Target document of an update does not exist.
    NotFound(DocRef),
    /// Field path is empty or contains unsupported characters.
    InvalidFieldPath(String),
    /// Persisted or supplied data does not have the expected shape.
    InvalidData(String),
    /// Body could not be encoded/decoded.
    Serialization(serde_json::Error),
    /// A transaction attempted a read after it already wrote.
    ReadAfterWrite,
    /// Batch exceeds the adapter's configured per-commit write limit.
    BatchTooLarge { len: usize, max: usize },
    /// Connection is not migrated for document storage.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(reference) => write!(f, "document not found: {reference}"),
            Self::InvalidFieldPath(path) => write!(f, "invalid field path: `{path}`"),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::ReadAfterWrite => {
                write!(f, "transaction reads must happen before any write")
            }
            Self::BatchTooLarge { len, max } => {
                write!(f, "batch has {len} writes; at most {max} are allowed")
            }
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Address of one document: collection path plus document id.
///
/// Collection paths may be nested (`users/u1/photos`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocRef {
    collection: String,
    id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for DocRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// One document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub reference: DocRef,
    pub data: Document,
}

impl DocumentSnapshot {
    /// Decodes the body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let value = serde_json::from_value(Value::Object(self.data.clone()))?;
        Ok(value)
    }

    /// Reads one (possibly nested) field.
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// One entry of an append-only list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    /// Generated push key, unique across all lists.
    pub key: String,
    pub data: Document,
}

/// Encodes a typed record as a document body.
///
/// # Errors
/// - `StoreError::InvalidData` when the record does not serialize to an
///   object.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidData(format!(
            "expected an object body, got `{}`",
            json_type_name(&other)
        ))),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read-then-write operations available inside `DocumentStore::run_transaction`.
///
/// Reads must come before the first write.
pub trait TransactionOps {
    fn get(&mut self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>>;
    fn set(&mut self, reference: &DocRef, data: Document) -> StoreResult<()>;
    fn update(&mut self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()>;
    fn delete(&mut self, reference: &DocRef) -> StoreResult<()>;
}

/// Document database used by the domain services.
pub trait DocumentStore {
    /// Inserts a document under a generated id.
    fn add(&self, collection: &str, data: Document) -> StoreResult<DocRef>;
    fn get(&self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>>;
    /// Creates or fully replaces a document.
    fn set(&self, reference: &DocRef, data: Document) -> StoreResult<()>;
    /// Applies field updates to an existing document.
    fn update(&self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()>;
    fn delete(&self, reference: &DocRef) -> StoreResult<()>;
    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;
    /// Runs `operation` in one isolated transaction; any error rolls back.
    fn run_transaction<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn TransactionOps) -> StoreResult<T>;
    /// Applies every write of `batch` atomically.
    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()>;
    /// Appends to an append-only list and returns the generated key.
    fn push(&self, list: &str, data: Document) -> StoreResult<String>;
    /// Reads a list in push order.
    fn list(&self, list: &str) -> StoreResult<Vec<ListEntry>>;

    /// Re-fetches `reference` and turns it into a start-after cursor.
    ///
    /// Returns `None` when the document no longer exists.
    fn cursor_for(
        &self,
        reference: &DocRef,
        order_field: Option<&FieldPath>,
    ) -> StoreResult<Option<PageCursor>> {
        Ok(self
            .get(reference)?
            .map(|snapshot| PageCursor::after(&snapshot, order_field)))
    }
}

impl<S: DocumentStore> DocumentStore for &S {
    fn add(&self, collection: &str, data: Document) -> StoreResult<DocRef> {
        (**self).add(collection, data)
    }

    fn get(&self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>> {
        (**self).get(reference)
    }

    fn set(&self, reference: &DocRef, data: Document) -> StoreResult<()> {
        (**self).set(reference, data)
    }

    fn update(&self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()> {
        (**self).update(reference, updates)
    }

    fn delete(&self, reference: &DocRef) -> StoreResult<()> {
        (**self).delete(reference)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        (**self).query(query)
    }

    fn run_transaction<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn TransactionOps) -> StoreResult<T>,
    {
        (**self).run_transaction(operation)
    }

    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        (**self).commit_batch(batch)
    }

    fn push(&self, list: &str, data: Document) -> StoreResult<String> {
        (**self).push(list, data)
    }

    fn list(&self, list: &str) -> StoreResult<Vec<ListEntry>> {
        (**self).list(list)
    }

    fn cursor_for(
        &self,
        reference: &DocRef,
        order_field: Option<&FieldPath>,
    ) -> StoreResult<Option<PageCursor>> {
        (**self).cursor_for(reference, order_field)
    }
}
