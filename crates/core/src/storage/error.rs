use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {id} (partition {partition})")]
    NotFound { id: String, partition: String },
    #[error("Document already exists: {id} (partition {partition})")]
    Conflict { id: String, partition: String },
    #[error("Precondition failed for document {id}: etag {etag} does not match")]
    PreconditionFailed { id: String, etag: String },
    #[error("Operation canceled")]
    Canceled,
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Request rate too large: {0}")]
    Throttled(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn not_found(id: impl ToString, partition: impl Into<String>) -> Self {
        Self::NotFound {
            id: id.to_string(),
            partition: partition.into(),
        }
    }

    pub fn conflict(id: impl ToString, partition: impl Into<String>) -> Self {
        Self::Conflict {
            id: id.to_string(),
            partition: partition.into(),
        }
    }

    pub fn precondition_failed(id: impl ToString, etag: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            id: id.to_string(),
            etag: etag.into(),
        }
    }

    /// Returns true for `NotFound`, so callers can treat a missing delete as success.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
