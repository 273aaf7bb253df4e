//! Pure functions for mapping store errors to HTTP status codes.
//!
//! Document databases report failures as HTTP statuses; this module gives
//! each [`StoreError`] variant the status such a store would have returned.

use super::StoreError;

/// Maps a [`StoreError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `Conflict` -> 409 (Conflict)
/// - `PreconditionFailed` -> 412 (Precondition Failed)
/// - `Throttled` -> 429 (Too Many Requests)
/// - `Canceled` -> 499 (Client Closed Request)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `InvalidQuery` / `InvalidData` -> 400 (Bad Request)
/// - `QueryFailed` / `Serialization` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use docpersist_core::storage::{store_error_to_status_code, StoreError};
///
/// let error = StoreError::not_found("abc-123", "TestDocument");
/// assert_eq!(store_error_to_status_code(&error), 404);
/// ```
pub fn store_error_to_status_code(error: &StoreError) -> u16 {
    match error {
        StoreError::NotFound { .. } => 404,
        StoreError::Conflict { .. } => 409,
        StoreError::PreconditionFailed { .. } => 412,
        StoreError::Throttled(_) => 429,
        StoreError::Canceled => 499,
        StoreError::ConnectionFailed(_) => 503,
        StoreError::InvalidQuery(_) => 400,
        StoreError::InvalidData(_) => 400,
        StoreError::QueryFailed(_) => 500,
        StoreError::Serialization(_) => 500,
    }
}
