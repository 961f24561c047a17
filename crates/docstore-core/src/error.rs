//! Error types for Docstore storage operations.
//!
//! Every adapter reports failures through [`StoreError`]. The orchestration
//! layer passes these through unchanged and the HTTP boundary maps the
//! [`ErrorKind`] to a status code.
//!
//! | `ErrorKind` | Meaning |
//! |---|---|
//! | `InvalidArgument` | A required field (id, data, date) was empty or missing |
//! | `MalformedId` | The id is present but not in the backend's native id syntax |
//! | `NotFound` | No live document matches the id |
//! | `Backend` | Connectivity or write failure in the underlying store |

use std::error::Error as StdError;

use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Classification of a [`StoreError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied an empty or missing required field.
    InvalidArgument,
    /// Identifier could not be parsed into the backend's native id type.
    MalformedId,
    /// No live document matched.
    NotFound,
    /// The backend failed (connectivity, write, decode).
    Backend,
}

/// Standard error type for storage adapters.
///
/// # Example
///
/// ```
/// use docstore_core::{ErrorKind, StoreError};
///
/// let err = StoreError::not_found("65a0c0ffee0000000000beef");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert!(err.to_string().contains("65a0c0ffee0000000000beef"));
/// ```
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required argument was empty or missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The identifier is not valid for this backend.
    #[error("malformed id '{id}': {reason}")]
    MalformedId {
        /// The rejected identifier, as supplied by the caller.
        id: String,
        /// Why the backend rejected it.
        reason: String,
    },

    /// No live document with this id exists.
    #[error("no document with id: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The underlying store failed.
    #[error("backend error: {message}")]
    Backend {
        /// Human-readable description of the failed operation.
        message: String,
        /// The driver error, if any.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a malformed-id error.
    #[must_use]
    pub fn malformed_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error for the given id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a backend error without an underlying cause.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend error wrapping a driver error.
    #[must_use]
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::MalformedId { .. } => ErrorKind::MalformedId,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Returns `true` if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            StoreError::invalid_argument("x").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            StoreError::malformed_id("abc", "bad hex").kind(),
            ErrorKind::MalformedId
        );
        assert_eq!(StoreError::not_found("abc").kind(), ErrorKind::NotFound);
        assert_eq!(StoreError::backend("down").kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_malformed_id_display() {
        let err = StoreError::malformed_id("zzz", "invalid character");
        assert_eq!(err.to_string(), "malformed id 'zzz': invalid character");
    }

    #[test]
    fn test_backend_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::backend_with_source("insert failed", io);

        assert_eq!(err.to_string(), "backend error: insert failed");
        let source = err.source().expect("source should be set");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn test_is_not_found() {
        assert!(StoreError::not_found("a").is_not_found());
        assert!(!StoreError::backend("a").is_not_found());
    }
}
