//! Identifier helpers shared by adapters.
//!
//! Identifiers are opaque strings at the adapter boundary. Each adapter
//! converts them into its native id type on the way in and back to a string
//! on the way out; the helpers here cover the checks every adapter repeats.

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Rejects an empty identifier.
///
/// # Example
///
/// ```
/// use docstore_core::id::require_id;
///
/// assert!(require_id("").is_err());
/// assert_eq!(require_id("abc").unwrap(), "abc");
/// ```
pub fn require_id(id: &str) -> StoreResult<&str> {
    if id.is_empty() {
        return Err(StoreError::invalid_argument("id must not be empty"));
    }
    Ok(id)
}

/// Generates a new time-ordered UUID (v7).
#[must_use]
pub fn new_uuid() -> Uuid {
    Uuid::now_v7()
}

/// Parses a UUID-keyed identifier.
///
/// Empty input is an [`InvalidArgument`](StoreError::InvalidArgument);
/// anything else that does not parse is a
/// [`MalformedId`](StoreError::MalformedId).
pub fn parse_uuid(id: &str) -> StoreResult<Uuid> {
    let id = require_id(id)?;
    Uuid::parse_str(id).map_err(|e| StoreError::malformed_id(id, e.to_string()))
}

/// Returns the canonical string form of a UUID id.
#[must_use]
pub fn uuid_to_string(id: Uuid) -> String {
    id.hyphenated().to_string()
}
