//! Request and response bodies for the document routes.

use chrono::{DateTime, Utc};
use docstore_core::Document;
use serde::{Deserialize, Serialize};

/// Body of `POST /base/create`.
///
/// The field is `Data`; lowercase `data` is accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateDocumentRequest {
    /// Payload to store.
    #[serde(rename = "Data", alias = "data", default)]
    pub data: String,
}

/// Body returned by a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    /// Identifier of the new document.
    pub id: String,
}

/// A document as returned by the read routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    /// Document id.
    pub id: String,
    /// Stored payload.
    pub data: String,
    /// Creation time, RFC 3339.
    pub created_at: DateTime<Utc>,
    /// Deletion time, omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            data: doc.data,
            created_at: doc.created_at,
            deleted_at: doc.deleted_at,
        }
    }
}
