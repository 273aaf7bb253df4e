//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `StoreError` from
//! `docpersist_core::storage`. Specific errors are mapped to semantic variants
//! (e.g., UNIQUE constraint to Conflict).

use docpersist_core::storage::StoreError;

/// Maps a rusqlite error to a StoreError.
///
/// # Error Mapping
///
/// - `SQLITE_BUSY` / `SQLITE_LOCKED` → `StoreError::Throttled`
/// - Connection errors → `StoreError::ConnectionFailed`
/// - All other errors → `StoreError::QueryFailed`
fn map_rusqlite_error(err: &rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            StoreError::Throttled(format!("Database busy: {err}"))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            StoreError::ConnectionFailed(format!("Cannot open database: {err}"))
        }

        _ => StoreError::QueryFailed(err.to_string()),
    }
}

/// Maps a rusqlite error raised while writing a known document.
fn map_rusqlite_error_with_key(err: &rusqlite::Error, id: &str, partition: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::conflict(id, partition)
        }

        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found(id, partition),

        _ => map_rusqlite_error(err),
    }
}

/// Maps a tokio_rusqlite error to a StoreError.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error) -> StoreError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(rusqlite_err),
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            StoreError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => StoreError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error with a known document key to a StoreError.
pub fn map_tokio_rusqlite_error_with_key(
    err: tokio_rusqlite::Error,
    id: &str,
    partition: &str,
) -> StoreError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error_with_key(rusqlite_err, id, partition)
        }
        _ => map_tokio_rusqlite_error(err),
    }
}

/// Maps an error raised while preparing or running a caller query.
///
/// Syntax errors and unknown parameters come from the caller's predicate and
/// are reported as `InvalidQuery`.
pub fn map_query_error(err: tokio_rusqlite::Error) -> StoreError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, message))
            if sqlite_err.code == rusqlite::ErrorCode::Unknown =>
        {
            StoreError::InvalidQuery(message.clone().unwrap_or_else(|| err.to_string()))
        }
        tokio_rusqlite::Error::Rusqlite(
            rusqlite::Error::InvalidParameterName(_) | rusqlite::Error::MultipleStatement,
        ) => StoreError::InvalidQuery(err.to_string()),
        _ => map_tokio_rusqlite_error(err),
    }
}
