//! HTTP server implementation.
//!
//! Built on Hyper and Tokio. The server accepts connections until the
//! [`ShutdownCoordinator`] starts draining, then closes the listener,
//! asks every open connection to finish its in-flight request and close,
//! and waits for the coordinator to stop.
//!
//! # Example
//!
//! ```rust,ignore
//! use docstore_server::{Server, ServerConfig, ShutdownCoordinator};
//!
//! let server = Server::new(ServerConfig::default(), service);
//! let coordinator = ShutdownCoordinator::new(config.shutdown_timeout());
//! let report = server.run(coordinator).await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use docstore_core::DocumentService;
use docstore_telemetry::log_request_complete;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::handlers::{document_router, Handlers};
use crate::response::{self, HttpResponse};
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownCoordinator, ShutdownReport};

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// An I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Docstore HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
    service: DocumentService,
}

/// State shared by every connection of one [`Server::serve`] call.
struct Shared {
    config: ServerConfig,
    router: Router,
    handlers: Handlers,
}

impl Server {
    /// Creates a server that dispatches to `service`.
    pub fn new(config: ServerConfig, service: DocumentService) -> Self {
        Self {
            config,
            router: document_router(),
            service,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Binds the configured address, installs OS signal handling and
    /// serves until shutdown completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self, coordinator: ShutdownCoordinator) -> Result<ShutdownReport, ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!(
                "invalid address '{}': {}",
                self.config.http_addr(),
                e
            ))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;

        coordinator.listen_for_os_signals();
        self.serve(listener, coordinator).await
    }

    /// Serves on an already-bound listener until shutdown completes.
    ///
    /// Returns the coordinator's report once it reaches `Stopped`.
    pub async fn serve(
        self,
        listener: TcpListener,
        coordinator: ShutdownCoordinator,
    ) -> Result<ShutdownReport, ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            address = %local_addr,
            backend = self.service.adapter().backend_name(),
            "Server listening"
        );

        let shared = Arc::new(Shared {
            handlers: Handlers::new(self.service, coordinator.clone()),
            config: self.config,
            router: self.router,
        });
        let tracker = ConnectionTracker::new();
        let mut draining = coordinator.draining();

        loop {
            tokio::select! {
                biased;

                () = &mut draining => break,

                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let shared = Arc::clone(&shared);
                        let token = tracker.acquire();
                        let coordinator = coordinator.clone();

                        tokio::spawn(async move {
                            if let Err(e) = shared.handle_connection(stream, remote_addr, &coordinator).await {
                                tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
            }
        }

        drop(listener);
        tracing::info!(address = %local_addr, "Listener closed");

        coordinator.drain(&tracker).await;
        let report = coordinator.wait_stopped().await;
        Ok(report)
    }
}

impl Shared {
    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        coordinator: &ShutdownCoordinator,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let shared = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let shared = Arc::clone(&shared);
            async move { shared.handle_request(req).await }
        });

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.read_timeout());
        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = coordinator.draining() => {
                tracing::debug!(remote = %remote_addr, "Closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(http.method = %method, http.path = %path, "Request received");

        let Some(route) = self.router.match_route(&method, &path) else {
            let allowed = self.router.allowed_methods(&path);
            let response = if allowed.is_empty() {
                response::text(StatusCode::NOT_FOUND, "404 page not found")
            } else {
                response::method_not_allowed(&allowed)
            };
            log_request_complete!(
                method,
                path,
                "none",
                response.status().as_u16(),
                started.elapsed().as_millis() as u64
            );
            return Ok(response);
        };

        let body = match tokio::time::timeout(self.config.read_timeout(), collect_body(req)).await
        {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read request body");
                return Ok(response::text(
                    StatusCode::BAD_REQUEST,
                    format!("could not read request body: {e}"),
                ));
            }
            Err(_) => {
                tracing::warn!(http.path = %path, "Request body read timed out");
                return Ok(response::text(
                    StatusCode::REQUEST_TIMEOUT,
                    "request body read timed out",
                ));
            }
        };

        let response = match tokio::time::timeout(
            self.config.write_timeout(),
            self.handlers.dispatch(&route, body),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(
                    operation_id = route.operation_id(),
                    "Handler execution timed out"
                );
                response::text(StatusCode::GATEWAY_TIMEOUT, "handler execution timed out")
            }
        };

        log_request_complete!(
            method,
            path,
            route.operation_id(),
            response.status().as_u16(),
            started.elapsed().as_millis() as u64
        );
        Ok(response)
    }
}

async fn collect_body(req: Request<Incoming>) -> Result<Bytes, hyper::Error> {
    let collected = req.into_body().collect().await?;
    Ok(collected.to_bytes())
}
