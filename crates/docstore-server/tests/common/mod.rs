//! Helpers for driving a real server on a loopback port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstore_core::{Document, DocumentService, NewDocument, StorageAdapter, StoreResult};
use docstore_server::{Server, ServerConfig, ServerError, ShutdownCoordinator, ShutdownReport};
use docstore_storage::InMemoryAdapter;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A server running in a background task.
pub struct TestServer {
    pub base_url: String,
    pub coordinator: ShutdownCoordinator,
    pub handle: JoinHandle<Result<ShutdownReport, ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Waits for `serve` to return.
    pub async fn stopped(self) -> ShutdownReport {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server should stop")
            .expect("server task should not panic")
            .expect("serve should succeed")
    }
}

pub async fn spawn(adapter: Arc<dyn StorageAdapter>) -> TestServer {
    spawn_with(adapter, ServerConfig::builder(), Duration::from_secs(10)).await
}

pub async fn spawn_with(
    adapter: Arc<dyn StorageAdapter>,
    config: docstore_server::ServerConfigBuilder,
    grace: Duration,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = config
        .http_addr(addr.to_string())
        .shutdown_timeout(grace)
        .build();
    let coordinator = ShutdownCoordinator::new(grace);
    let server = Server::new(config, DocumentService::new(adapter));

    let handle = tokio::spawn(server.serve(listener, coordinator.clone()));

    TestServer {
        base_url: format!("http://{addr}"),
        coordinator,
        handle,
    }
}

pub fn memory() -> Arc<dyn StorageAdapter> {
    Arc::new(InMemoryAdapter::new())
}

/// Delegates to an in-memory store but holds every `get_by_id` for `delay`.
pub struct SlowAdapter {
    inner: InMemoryAdapter,
    delay: Duration,
    pub started: Arc<Notify>,
}

impl SlowAdapter {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryAdapter::new(),
            delay,
            started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl StorageAdapter for SlowAdapter {
    async fn create(&self, document: NewDocument) -> StoreResult<String> {
        self.inner.create(document).await
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Document> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_id(id).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.inner.delete(id).await
    }

    async fn list_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Document>> {
        self.inner.list_since(since).await
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.inner.clear_all().await
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }
}
