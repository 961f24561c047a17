//! Relational storage adapter (SQLite via `sqlx`).
//!
//! Row layout, one table with positional columns:
//!
//! ```text
//! documents(id TEXT PRIMARY KEY, data TEXT NOT NULL,
//!           created_at INTEGER NOT NULL, deleted_at INTEGER NULL)
//! ```
//!
//! Ids are UUID v7 strings generated here rather than auto-increment keys, so
//! callers get the same kind of opaque string as from the document store.
//! Timestamps are integer microseconds since the epoch. Every statement uses
//! bind parameters; `data` is arbitrary caller text.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use docstore_core::id::{new_uuid, parse_uuid, uuid_to_string};
use docstore_core::{time, Document, NewDocument, StorageAdapter, StoreError, StoreResult};

/// Default pool size for file-backed databases.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY NOT NULL,
    data        TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    deleted_at  INTEGER NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents (created_at)";

/// SQLite-backed adapter.
#[derive(Debug, Clone)]
pub struct SqlAdapter {
    pool: SqlitePool,
}

impl SqlAdapter {
    /// Connects to `url` and creates the schema if needed.
    ///
    /// In-memory URLs (`sqlite::memory:`) are pinned to one long-lived
    /// connection; each SQLite in-memory connection is its own database.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::backend_with_source(format!("invalid sqlite url: {url}"), e))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(DEFAULT_MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::backend_with_source("failed to connect to sqlite", e))?;

        let adapter = Self::from_pool(pool);
        adapter.ensure_schema().await?;
        tracing::info!(backend = "sqlite", in_memory, "Relational store connected");
        Ok(adapter)
    }

    /// Wraps an existing pool without touching the schema.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `documents` table and its index if they do not exist.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::backend_with_source("failed to create schema", e))?;
        }
        Ok(())
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_document(row: &SqliteRow) -> StoreResult<Document> {
        let column = |name: &str, e: sqlx::Error| {
            StoreError::backend_with_source(format!("failed to decode column {name}"), e)
        };

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let data: String = row.try_get("data").map_err(|e| column("data", e))?;
        let created_at: i64 = row.try_get("created_at").map_err(|e| column("created_at", e))?;
        let deleted_at: Option<i64> = row.try_get("deleted_at").map_err(|e| column("deleted_at", e))?;

        Ok(Document {
            id,
            data,
            created_at: time::from_epoch_micros(created_at)?,
            deleted_at: deleted_at.map(time::from_epoch_micros).transpose()?,
        })
    }
}

#[async_trait]
impl StorageAdapter for SqlAdapter {
    async fn create(&self, document: NewDocument) -> StoreResult<String> {
        let key = match document.id.as_deref() {
            Some(id) => parse_uuid(id)?,
            None => new_uuid(),
        };
        let id = uuid_to_string(key);
        let created_at = document.created_at_or(time::now());

        sqlx::query(
            "INSERT INTO documents (id, data, created_at, deleted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&document.data)
        .bind(time::to_epoch_micros(created_at))
        .bind(document.deleted_at.map(time::to_epoch_micros))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::backend_with_source("could not insert document", e))?;

        tracing::debug!(backend = "sqlite", id = %id, "Document created");
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Document> {
        let key = uuid_to_string(parse_uuid(id)?);

        let row = sqlx::query("SELECT id, data, created_at, deleted_at FROM documents WHERE id = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend_with_source("could not query document", e))?;

        match row {
            Some(row) => Self::row_to_document(&row),
            None => Err(StoreError::not_found(id)),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let key = uuid_to_string(parse_uuid(id)?);

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(&key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend_with_source("could not delete document", e))?;
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, data, created_at, deleted_at FROM documents WHERE created_at > ?",
        )
        .bind(time::to_epoch_micros(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::backend_with_source("could not list documents", e))?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn clear_all(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend_with_source("could not clear documents", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use docstore_core::ErrorKind;

    async fn adapter() -> SqlAdapter {
        SqlAdapter::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = adapter().await;
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_data_is_stored_verbatim() {
        let store = adapter().await;
        let hostile = "'); DROP TABLE documents; --";

        let id = store.create(NewDocument::new(hostile)).await.unwrap();
        assert_eq!(store.get_by_id(&id).await.unwrap().data, hostile);
    }

    #[tokio::test]
    async fn test_created_at_keeps_microseconds() {
        let store = adapter().await;
        let at = time::from_epoch_micros(1_700_000_000_123_456).unwrap();

        let id = store
            .create(NewDocument::new("x").with_created_at(at))
            .await
            .unwrap();
        assert_eq!(store.get_by_id(&id).await.unwrap().created_at, at);
    }

    #[tokio::test]
    async fn test_deleted_at_roundtrips() {
        let store = adapter().await;
        let at = time::now() - ChronoDuration::hours(1);
        let doc = NewDocument {
            deleted_at: Some(at),
            ..NewDocument::new("x")
        };

        let id = store.create(doc).await.unwrap();
        let stored = store.get_by_id(&id).await.unwrap();
        assert_eq!(
            stored.deleted_at.map(time::to_epoch_micros),
            Some(time::to_epoch_micros(at))
        );
    }

    #[tokio::test]
    async fn test_duplicate_id_is_backend_error() {
        let store = adapter().await;
        let id = uuid_to_string(new_uuid());

        store
            .create(NewDocument::new("a").with_id(id.clone()))
            .await
            .unwrap();
        let err = store
            .create(NewDocument::new("b").with_id(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn test_uppercase_id_is_normalized() {
        let store = adapter().await;
        let id = store.create(NewDocument::new("x")).await.unwrap();

        let doc = store.get_by_id(&id.to_uppercase()).await.unwrap();
        assert_eq!(doc.id, id);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = SqlAdapter::connect("postgres://nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }
}
