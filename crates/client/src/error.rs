//! Client error types.

use docpersist_core::storage::StoreError;
use docpersist_core::OptionsError;
use docpersist_storage::config::ConfigError;
use thiserror::Error;

/// Result type alias for client setup and CLI input handling.
///
/// Document operations return `docpersist_core::storage::Result` so callers
/// can match on the store error kinds directly.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while building a client or reading CLI input.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
