//! Document Store
//!
//! Collections of JSON documents keyed by id, kept in an embedded SQLite
//! database (rusqlite with r2d2 connection pooling). Filtering happens on
//! the decoded documents, so only top-level fields can be filtered on.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};

use crate::utils::error::{AppError, AppResult};

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// A filter on one top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value
    Eq(String, Value),
    /// Field equals one of the values
    In(String, Vec<Value>),
    /// Field is an array containing the value
    ArrayContains(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In(field.into(), values)
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ArrayContains(field.into(), value.into())
    }

    fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::In(field, values) => doc.get(field).is_some_and(|v| values.contains(v)),
            Filter::ArrayContains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Handle to the document store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct DocumentStore {
    pool: DbPool,
}

impl DocumentStore {
    /// Open (or create) a store file, creating parent directories.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        tracing::debug!("[DocumentStore] opened {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// The pool holds a single connection so every caller sees the same
    /// in-memory database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Read one document.
    pub fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let conn = self.get_connection()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|text| serde_json::from_str(&text).map_err(AppError::from))
            .transpose()
    }

    /// All documents in a collection matching every filter, in insertion order.
    pub fn query(&self, collection: &str, filters: &[Filter]) -> AppResult<Vec<Document>> {
        let conn = self.get_connection()?;
        let mut stmt =
            conn.prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, text) = row?;
            let data: Value = serde_json::from_str(&text)?;
            if filters.iter().all(|f| f.matches(&data)) {
                documents.push(Document { id, data });
            }
        }
        Ok(documents)
    }

    /// Write a document, replacing any stored version.
    pub fn set(&self, collection: &str, id: &str, data: &Value) -> AppResult<()> {
        require_object(data)?;
        let conn = self.get_connection()?;
        upsert(&conn, collection, id, data)?;
        Ok(())
    }

    /// Read-modify-write an existing document in one transaction.
    ///
    /// Fails with `NotFound` when the document does not exist.
    pub fn update<F>(&self, collection: &str, id: &str, apply: F) -> AppResult<Value>
    where
        F: FnOnce(&mut Map<String, Value>) -> AppResult<()>,
    {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let mut doc = read_object(&tx, collection, id)?
            .ok_or_else(|| AppError::not_found(format!("{}/{}", collection, id)))?;
        apply(&mut doc)?;
        let value = Value::Object(doc);
        upsert(&tx, collection, id, &value)?;
        tx.commit()?;
        Ok(value)
    }

    /// Store a document under a generated id and return the id.
    pub fn insert(&self, collection: &str, data: &Value) -> AppResult<String> {
        require_object(data)?;
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection, id, serde_json::to_string(data)?],
        )?;
        Ok(id)
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

fn require_object(value: &Value) -> AppResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AppError::validation("documents must be JSON objects"))
}

fn read_object(
    conn: &rusqlite::Connection,
    collection: &str,
    id: &str,
) -> AppResult<Option<Map<String, Value>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        None => Ok(None),
        Some(text) => match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(AppError::database(format!(
                "stored document {}/{} is not an object",
                collection, id
            ))),
        },
    }
}

fn upsert(conn: &rusqlite::Connection, collection: &str, id: &str, data: &Value) -> AppResult<()> {
    conn.execute(
        "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, id) DO UPDATE SET
            data = excluded.data,
            updated_at = CURRENT_TIMESTAMP",
        params![collection, id, serde_json::to_string(data)?],
    )?;
    Ok(())
}
