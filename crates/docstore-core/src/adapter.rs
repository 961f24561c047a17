//! Storage adapter contract.
//!
//! Port/adapter split for backend flexibility:
//! - Document store (MongoDB)
//! - Relational store (SQLite)
//! - In-memory (tests, local runs)
//!
//! Every implementation honours the same semantics regardless of how it
//! represents ids and timestamps natively.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::document::{Document, NewDocument};
use crate::error::StoreResult;

/// A backend capable of persisting [`Document`]s.
///
/// Implementations must be safe to share across concurrently served requests;
/// no additional locking is layered on top.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Persists a document and returns its string id.
    ///
    /// - `id` absent: the adapter generates a backend-native unique id.
    /// - `created_at` absent: stamped with the current time at persistence.
    ///
    /// Fails with `MalformedId` if a supplied id is not in native syntax and
    /// with `Backend` on connectivity or write failure.
    async fn create(&self, document: NewDocument) -> StoreResult<String>;

    /// Fetches a live document.
    ///
    /// Fails with `InvalidArgument` for an empty id, `MalformedId` for an
    /// unparseable one, and `NotFound` when nothing matches.
    async fn get_by_id(&self, id: &str) -> StoreResult<Document>;

    /// Hard-deletes a document.
    ///
    /// Deleting an id that does not exist succeeds silently. Empty and
    /// unparseable ids fail as in [`get_by_id`](Self::get_by_id).
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Returns every live document with `created_at` strictly after `since`.
    ///
    /// Order is unspecified. Returns an empty vector when nothing matches.
    async fn list_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>>;

    /// Removes all documents. Administrative; not exposed over HTTP.
    async fn clear_all(&self) -> StoreResult<()>;

    /// Short backend name used in log fields.
    fn backend_name(&self) -> &'static str;
}
