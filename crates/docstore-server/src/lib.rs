//! # Docstore Server
//!
//! HTTP surface and shutdown coordination for Docstore.
//!
//! - [`Server`] serves the document routes over HTTP/1.1 via Hyper
//! - [`Router`] maps method and path templates to operation ids
//! - [`ShutdownCoordinator`] drives `Running -> Draining -> Stopped`,
//!   triggered by an OS signal or a request to `/shutdown`
//!
//! ## Routes
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/` | `ping` |
//! | any | `/shutdown` | `shutdown` |
//! | POST | `/base/create` | `createDocument` |
//! | GET | `/base/delete/{id}` | `deleteDocument` |
//! | GET | `/base/since/{date}` | `listDocumentsSince` |
//! | GET | `/base/{id}` | `getDocument` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use docstore_server::{Server, ServerConfig, ShutdownCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     let coordinator = ShutdownCoordinator::new(config.shutdown_timeout());
//!
//!     let report = Server::new(config, service).run(coordinator).await?;
//!     println!("stopped after {:?}", report.elapsed);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/docstore-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
pub mod dto;
pub mod handlers;
pub mod response;
mod router;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use handlers::{document_router, status_for, Handlers};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerError};
pub use shutdown::{
    DrainOutcome, ShutdownCoordinator, ShutdownReport, ShutdownState, ShutdownTrigger,
};
