//! In-memory storage adapter.
//!
//! HashMap-backed implementation keyed by UUID. Used for tests and for
//! `memory://` backends; nothing survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use docstore_core::id::{new_uuid, parse_uuid, uuid_to_string};
use docstore_core::{time, Document, NewDocument, StorageAdapter, StoreError, StoreResult};

/// Volatile adapter holding documents in process memory.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdapter {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl InMemoryAdapter {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns `true` if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryAdapter {
    async fn create(&self, document: NewDocument) -> StoreResult<String> {
        let key = match document.id.as_deref() {
            Some(id) => parse_uuid(id)?,
            None => new_uuid(),
        };
        let id = uuid_to_string(key);

        let mut documents = self.documents.write();
        if documents.contains_key(&key) {
            return Err(StoreError::backend(format!("duplicate id: {id}")));
        }

        let created_at = document.created_at_or(time::now());
        documents.insert(
            key,
            Document {
                id: id.clone(),
                data: document.data,
                created_at,
                deleted_at: document.deleted_at,
            },
        );
        tracing::debug!(backend = "memory", id = %id, "Document created");

        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Document> {
        let key = parse_uuid(id)?;
        self.documents
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let key = parse_uuid(id)?;
        self.documents.write().remove(&key);
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .values()
            .filter(|doc| doc.created_at > since)
            .cloned()
            .collect())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.documents.write().clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
