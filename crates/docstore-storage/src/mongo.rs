//! Document-store adapter (MongoDB).
//!
//! Documents live in one collection with fields `_id` (ObjectId),
//! `data`, `created_at` and `deleted_at` (BSON datetimes). Ids cross the
//! adapter boundary as 24-character lowercase hex strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use docstore_core::id::require_id;
use docstore_core::{time, Document, NewDocument, StorageAdapter, StoreError, StoreResult};

/// Default database name.
pub const DEFAULT_DATABASE: &str = "test";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "base";

/// Stored shape of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MongoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    data: String,
    created_at: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_at: Option<BsonDateTime>,
}

impl MongoDocument {
    fn from_new(document: NewDocument) -> StoreResult<Self> {
        let id = match document.id.as_deref() {
            Some(id) => parse_object_id(id)?,
            None => ObjectId::new(),
        };
        let created_at = document.created_at_or(time::now());

        Ok(Self {
            id,
            data: document.data,
            created_at: to_bson(created_at),
            deleted_at: document.deleted_at.map(to_bson),
        })
    }

    fn into_document(self) -> StoreResult<Document> {
        Ok(Document {
            id: self.id.to_hex(),
            data: self.data,
            created_at: time::from_epoch_millis(self.created_at.timestamp_millis())?,
            deleted_at: self
                .deleted_at
                .map(|at| time::from_epoch_millis(at.timestamp_millis()))
                .transpose()?,
        })
    }
}

fn to_bson(at: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(time::to_epoch_millis(at))
}

/// Parses a hex ObjectId, mapping failures to `InvalidArgument` (empty) or
/// `MalformedId`.
pub fn parse_object_id(id: &str) -> StoreResult<ObjectId> {
    let id = require_id(id)?;
    ObjectId::parse_str(id).map_err(|e| StoreError::malformed_id(id, e.to_string()))
}

fn driver_error(context: &str, e: mongodb::error::Error) -> StoreError {
    StoreError::backend_with_source(context.to_string(), e)
}

/// MongoDB-backed adapter.
#[derive(Debug, Clone)]
pub struct MongoAdapter {
    client: Client,
    collection: Collection<MongoDocument>,
}

impl MongoAdapter {
    /// Connects to `uri` with the Stable API v1 and pings the deployment.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| driver_error("invalid mongodb connection string", e))?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client =
            Client::with_options(options).map_err(|e| driver_error("failed to build client", e))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| driver_error("failed to reach mongodb", e))?;

        tracing::info!(
            backend = "mongodb",
            database = %database,
            collection = %collection,
            "Document store connected"
        );

        Ok(Self::from_client(client, database, collection))
    }

    /// Wraps an existing client without pinging it.
    #[must_use]
    pub fn from_client(client: Client, database: &str, collection: &str) -> Self {
        let collection = client.database(database).collection(collection);
        Self { client, collection }
    }

    /// Returns the driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Disconnects the client, waiting for in-flight operations.
    pub async fn disconnect(&self) {
        self.client.clone().shutdown().await;
    }
}

#[async_trait]
impl StorageAdapter for MongoAdapter {
    async fn create(&self, document: NewDocument) -> StoreResult<String> {
        let stored = MongoDocument::from_new(document)?;
        let id = stored.id.to_hex();

        self.collection
            .insert_one(stored)
            .await
            .map_err(|e| driver_error("could not insert document", e))?;

        tracing::debug!(backend = "mongodb", id = %id, "Document created");
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Document> {
        let oid = parse_object_id(id)?;

        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| driver_error("could not query document", e))?
            .ok_or_else(|| StoreError::not_found(id))?
            .into_document()
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = parse_object_id(id)?;

        self.collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| driver_error("could not delete document", e))?;
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection
            .find(doc! { "created_at": { "$gt": to_bson(since) } })
            .await
            .map_err(|e| driver_error("could not list documents", e))?;

        let stored: Vec<MongoDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| driver_error("could not read documents", e))?;

        stored.into_iter().map(MongoDocument::into_document).collect()
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.collection
            .delete_many(doc! {})
            .await
            .map_err(|e| driver_error("could not clear documents", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
