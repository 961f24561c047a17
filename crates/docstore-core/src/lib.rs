//! # Docstore Core
//!
//! Domain types and contracts shared by every Docstore crate:
//!
//! - [`Document`] / [`NewDocument`] - the persisted entity
//! - [`StorageAdapter`] - the backend contract
//! - [`DocumentService`] - orchestration over one adapter
//! - [`StoreError`] - the error taxonomy surfaced by adapters
//! - [`id`] and [`time`] - id and timestamp normalization helpers

#![doc(html_root_url = "https://docs.rs/docstore-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod document;
mod error;
pub mod id;
mod service;
pub mod time;

pub use adapter::StorageAdapter;
pub use document::{Document, NewDocument};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use service::DocumentService;
