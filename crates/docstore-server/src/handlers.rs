//! Route table and per-operation handlers.
//!
//! Each handler turns a matched route into a call on the
//! [`DocumentService`] and maps the result to a response. Failures are
//! written as plain text, prefixed with what the handler was attempting.
//!
//! | `ErrorKind` | Status |
//! |---|---|
//! | `InvalidArgument` | 400 |
//! | `MalformedId` | 400 |
//! | `NotFound` | 500 |
//! | `Backend` | 500 |

use bytes::Bytes;
use docstore_core::{time, DocumentService, ErrorKind, StoreError};
use docstore_telemetry::log_request_error;
use http::{Method, StatusCode};

use crate::dto::{CreateDocumentRequest, CreateDocumentResponse, DocumentResponse};
use crate::response::{self, HttpResponse};
use crate::router::{RouteMatch, Router};
use crate::shutdown::ShutdownCoordinator;

/// Operation ids, as resolved by the router.
pub mod operations {
    /// `GET /`
    pub const PING: &str = "ping";
    /// `* /shutdown`
    pub const SHUTDOWN: &str = "shutdown";
    /// `POST /base/create`
    pub const CREATE_DOCUMENT: &str = "createDocument";
    /// `GET /base/delete/{id}`
    pub const DELETE_DOCUMENT: &str = "deleteDocument";
    /// `GET /base/since/{date}`
    pub const LIST_DOCUMENTS_SINCE: &str = "listDocumentsSince";
    /// `GET /base/{id}`
    pub const GET_DOCUMENT: &str = "getDocument";
}

/// Builds the router for every document route.
///
/// `/base/{id}` is registered last so the literal `delete` and `since`
/// prefixes take precedence.
#[must_use]
pub fn document_router() -> Router {
    let mut router = Router::new();
    router.add_route(Method::GET, "/", operations::PING);
    router.add_any_route("/shutdown", operations::SHUTDOWN);
    router.add_route(Method::POST, "/base/create", operations::CREATE_DOCUMENT);
    router.add_route(Method::GET, "/base/delete/{id}", operations::DELETE_DOCUMENT);
    router.add_route(
        Method::GET,
        "/base/since/{date}",
        operations::LIST_DOCUMENTS_SINCE,
    );
    router.add_route(Method::GET, "/base/{id}", operations::GET_DOCUMENT);
    router
}

/// Maps a storage failure to a response status.
///
/// `NotFound` surfaces as 500 to stay compatible with existing clients.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::MalformedId => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Dispatches matched routes to the document service.
#[derive(Debug, Clone)]
pub struct Handlers {
    service: DocumentService,
    coordinator: ShutdownCoordinator,
}

impl Handlers {
    /// Creates handlers over `service`, reporting shutdown requests to
    /// `coordinator`.
    pub fn new(service: DocumentService, coordinator: ShutdownCoordinator) -> Self {
        Self {
            service,
            coordinator,
        }
    }

    /// Runs the handler for `route`.
    pub async fn dispatch(&self, route: &RouteMatch, body: Bytes) -> HttpResponse {
        match route.operation_id() {
            operations::PING => response::empty(StatusCode::OK),
            operations::SHUTDOWN => self.shutdown(),
            operations::CREATE_DOCUMENT => self.create(&body).await,
            operations::DELETE_DOCUMENT => self.delete(route.param("id").unwrap_or("")).await,
            operations::LIST_DOCUMENTS_SINCE => {
                self.since(route.param("date").unwrap_or("")).await
            }
            operations::GET_DOCUMENT => self.get(route.param("id").unwrap_or("")).await,
            other => {
                tracing::error!(operation_id = other, "No handler for operation");
                response::text(StatusCode::NOT_IMPLEMENTED, "not implemented")
            }
        }
    }

    fn shutdown(&self) -> HttpResponse {
        if self.coordinator.request_shutdown() {
            tracing::info!("Shutdown requested");
        }
        response::empty(StatusCode::OK)
    }

    async fn create(&self, body: &[u8]) -> HttpResponse {
        let request: CreateDocumentRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                return failure(
                    operations::CREATE_DOCUMENT,
                    StatusCode::BAD_REQUEST,
                    format!("invalid request body: {e}"),
                );
            }
        };

        if request.data.is_empty() {
            return failure(
                operations::CREATE_DOCUMENT,
                StatusCode::BAD_REQUEST,
                "missing parameters: Data",
            );
        }

        match self.service.create_base_document(request.data).await {
            Ok(id) => response::json(StatusCode::OK, &CreateDocumentResponse { id }),
            Err(e) => store_failure(operations::CREATE_DOCUMENT, "could not create document", &e),
        }
    }

    async fn delete(&self, id: &str) -> HttpResponse {
        if id.is_empty() {
            return failure(
                operations::DELETE_DOCUMENT,
                StatusCode::BAD_REQUEST,
                "missing id to delete",
            );
        }

        match self.service.delete_base_document(id).await {
            Ok(()) => response::empty(StatusCode::OK),
            Err(e) => store_failure(operations::DELETE_DOCUMENT, "could not delete document", &e),
        }
    }

    async fn get(&self, id: &str) -> HttpResponse {
        if id.is_empty() {
            return failure(
                operations::GET_DOCUMENT,
                StatusCode::BAD_REQUEST,
                "missing id to find",
            );
        }

        match self.service.get_base_document_by_id(id).await {
            Ok(doc) => response::json(StatusCode::OK, &DocumentResponse::from(doc)),
            Err(e) => store_failure(operations::GET_DOCUMENT, "could not find document", &e),
        }
    }

    async fn since(&self, raw: &str) -> HttpResponse {
        if raw.is_empty() {
            return failure(
                operations::LIST_DOCUMENTS_SINCE,
                StatusCode::BAD_REQUEST,
                "missing date to find",
            );
        }

        let since = match time::since_from_path(raw) {
            Ok(since) => since,
            Err(_) => {
                return failure(
                    operations::LIST_DOCUMENTS_SINCE,
                    StatusCode::BAD_REQUEST,
                    format!("invalid date sent: {raw}"),
                );
            }
        };

        match self.service.get_all_created_since(since).await {
            Ok(docs) => {
                let body: Vec<DocumentResponse> =
                    docs.into_iter().map(DocumentResponse::from).collect();
                response::json(StatusCode::OK, &body)
            }
            Err(e) => store_failure(
                operations::LIST_DOCUMENTS_SINCE,
                "could not find documents",
                &e,
            ),
        }
    }
}

fn failure(operation: &str, status: StatusCode, message: impl Into<String>) -> HttpResponse {
    let message = message.into();
    log_request_error!(operation, status.as_u16(), message);
    response::text(status, message)
}

fn store_failure(operation: &str, context: &str, error: &StoreError) -> HttpResponse {
    failure(operation, status_for(error.kind()), format!("{context}: {error}"))
}
