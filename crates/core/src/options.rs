//! Document client options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::ResourcePath;

/// Default page size for enumeration.
pub const DEFAULT_ITEMS_PER_REQUEST: usize = 50;

/// Largest page size accepted by the stores.
pub const MAX_ITEMS_PER_REQUEST: usize = 1_000;

/// How updates treat the document's etag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyMode {
    /// Send the etag as an if-match precondition when the document has one.
    #[default]
    #[serde(alias = "Optimistic")]
    Optimistic,
    /// Never send a precondition; the last write wins.
    #[serde(alias = "LastWriterWins")]
    LastWriterWins,
}

impl FromStr for ConcurrencyMode {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "lastwriterwins" | "lww" => Ok(Self::LastWriterWins),
            _ => Err(OptionsError::InvalidConcurrencyMode(s.to_string())),
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimistic => write!(f, "optimistic"),
            Self::LastWriterWins => write!(f, "last-writer-wins"),
        }
    }
}

/// Errors that can occur when validating options.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Missing required option: {0}")]
    Missing(&'static str),
    #[error("Invalid {field} '{value}': only letters, digits, '.', '_' and '-' are allowed")]
    InvalidIdentifier { field: &'static str, value: String },
    #[error("ItemsPerRequest must be between 1 and 1000, got {0}")]
    InvalidItemsPerRequest(usize),
    #[error("Unknown concurrency mode: {0}")]
    InvalidConcurrencyMode(String),
}

/// Settings the document client is constructed from.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentClientOptions {
    /// Connection target of the store.
    pub account_endpoint: String,
    /// Credential for the store.
    pub account_key: String,
    /// Logical database name.
    pub database_id: String,
    /// Logical collection name.
    pub container_id: String,
    /// Page size used by enumeration.
    pub items_per_request: usize,
    pub concurrency: ConcurrencyMode,
}

impl DocumentClientOptions {
    pub fn new(database_id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            account_endpoint: String::new(),
            account_key: String::new(),
            database_id: database_id.into(),
            container_id: container_id.into(),
            items_per_request: DEFAULT_ITEMS_PER_REQUEST,
            concurrency: ConcurrencyMode::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.account_endpoint = endpoint.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = key.into();
        self
    }

    pub fn with_items_per_request(mut self, items_per_request: usize) -> Self {
        self.items_per_request = items_per_request;
        self
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Checks that the options can be used to open a store.
    pub fn validate(&self) -> Result<(), OptionsError> {
        validate_identifier("DatabaseId", &self.database_id)?;
        validate_identifier("ContainerId", &self.container_id)?;

        if self.items_per_request == 0 || self.items_per_request > MAX_ITEMS_PER_REQUEST {
            return Err(OptionsError::InvalidItemsPerRequest(self.items_per_request));
        }

        Ok(())
    }

    pub fn resource_path(&self) -> ResourcePath {
        ResourcePath::new(&self.database_id, &self.container_id)
    }
}

// The account key never ends up in logs.
impl fmt::Debug for DocumentClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentClientOptions")
            .field("account_endpoint", &self.account_endpoint)
            .field(
                "account_key",
                &if self.account_key.is_empty() {
                    ""
                } else {
                    "<redacted>"
                },
            )
            .field("database_id", &self.database_id)
            .field("container_id", &self.container_id)
            .field("items_per_request", &self.items_per_request)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), OptionsError> {
    if value.is_empty() {
        return Err(OptionsError::Missing(field));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(OptionsError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
