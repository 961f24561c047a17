//! The persisted document entity.
//!
//! [`NewDocument`] is what callers hand to [`StorageAdapter::create`](crate::StorageAdapter::create);
//! the adapter fills in whatever the caller left out. [`Document`] is what
//! every read returns: the id is always in its opaque string form and the
//! creation timestamp is always set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document as stored and returned by an adapter.
///
/// Serializes to the wire shape
/// `{"id": ..., "data": ..., "createdAt": ..., "deletedAt": ...}` with
/// `deletedAt` omitted when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Opaque identifier, backend-assigned unless supplied on create.
    pub id: String,

    /// Caller-supplied payload.
    pub data: String,

    /// When the document was persisted.
    pub created_at: DateTime<Utc>,

    /// Reserved for soft deletes; never populated by the current adapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input to a create call.
///
/// # Example
///
/// ```
/// use docstore_core::NewDocument;
///
/// let doc = NewDocument::new("hello");
/// assert!(doc.id.is_none());
/// assert!(doc.created_at.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDocument {
    /// Identifier to use instead of a generated one. Must be in the
    /// backend's native id syntax.
    pub id: Option<String>,

    /// Payload to persist.
    pub data: String,

    /// Creation time to record instead of the persistence instant.
    pub created_at: Option<DateTime<Utc>>,

    /// Deletion marker to carry through unchanged.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl NewDocument {
    /// Creates a document with only a payload.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an explicit creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Resolves the creation timestamp, stamping `now` when absent.
    #[must_use]
    pub fn created_at_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at.unwrap_or(now)
    }
}
