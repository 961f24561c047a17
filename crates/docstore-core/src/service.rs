//! Document orchestration service.
//!
//! A stateless pass-through between the HTTP boundary and whichever
//! [`StorageAdapter`] was configured at startup. It adds no validation,
//! caching or retries: adapter results and errors come back unchanged.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapter::StorageAdapter;
use crate::document::{Document, NewDocument};
use crate::error::StoreResult;

/// Application-level operations on base documents.
///
/// Cloning is cheap; all clones share the same adapter.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docstore_core::DocumentService;
///
/// let service = DocumentService::new(Arc::new(adapter));
/// let id = service.create_base_document("hello").await?;
/// let doc = service.get_base_document_by_id(&id).await?;
/// assert_eq!(doc.data, "hello");
/// ```
#[derive(Clone)]
pub struct DocumentService {
    adapter: Arc<dyn StorageAdapter>,
}

impl fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentService")
            .field("backend", &self.adapter.backend_name())
            .finish()
    }
}

impl DocumentService {
    /// Creates a service over the given adapter.
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// Returns the underlying adapter.
    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    /// Creates a document holding `data` and returns its id.
    pub async fn create_base_document(&self, data: impl Into<String>) -> StoreResult<String> {
        self.adapter.create(NewDocument::new(data)).await
    }

    /// Deletes the document with `id`.
    pub async fn delete_base_document(&self, id: &str) -> StoreResult<()> {
        self.adapter.delete(id).await
    }

    /// Fetches the document with `id`.
    pub async fn get_base_document_by_id(&self, id: &str) -> StoreResult<Document> {
        self.adapter.get_by_id(id).await
    }

    /// Lists documents created strictly after `since`.
    pub async fn get_all_created_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        self.adapter.list_since(since).await
    }
}
