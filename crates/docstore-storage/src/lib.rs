//! # Docstore Storage
//!
//! [`StorageAdapter`](docstore_core::StorageAdapter) implementations:
//!
//! | Adapter | Feature | Ids | URL |
//! |---------|---------|-----|-----|
//! | [`InMemoryAdapter`] | always | UUID v7 | `memory://` |
//! | `SqlAdapter` | `sqlite` | UUID v7 | `sqlite:...` |
//! | `MongoAdapter` | `mongo` | ObjectId hex | `mongodb://...` |
//!
//! Use [`connect`] to pick one from a URL at startup.

#![doc(html_root_url = "https://docs.rs/docstore-storage/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod connect;
mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "sqlite")]
pub mod sql;

pub use connect::{connect, redact, Backend, ConnectOptions};
pub use memory::InMemoryAdapter;
#[cfg(feature = "mongo")]
pub use mongo::MongoAdapter;
#[cfg(feature = "sqlite")]
pub use sql::SqlAdapter;
