//! Document store backends.
//!
//! This crate provides concrete implementations of the `DocumentStore` trait
//! defined in `docpersist_core::storage`. The persistent backend is selected
//! at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `sqlite`: SQLite backend using `rusqlite` and `tokio-rusqlite`
//! - `dynamodb`: AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive. With neither enabled, `connect`
//! returns the in-memory store, which is always available for tests.
//!
//! # Examples
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p docpersist_client --features sqlite
//! ```

#[cfg(all(feature = "sqlite", feature = "dynamodb"))]
compile_error!(
    "Features 'sqlite' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

use std::sync::Arc;

use docpersist_core::options::DocumentClientOptions;
use docpersist_core::storage::{DocumentStore, Result};

pub mod config;
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

/// Name of the backend `connect` opens in this build.
pub const fn backend_name() -> &'static str {
    if cfg!(feature = "sqlite") {
        "sqlite"
    } else if cfg!(feature = "dynamodb") {
        "dynamodb"
    } else {
        "inmemory"
    }
}

/// Opens the store selected at compile time.
pub async fn connect(options: &DocumentClientOptions) -> Result<Arc<dyn DocumentStore>> {
    tracing::debug!(
        backend = backend_name(),
        database_id = %options.database_id,
        container_id = %options.container_id,
        "Opening document store"
    );

    #[cfg(feature = "sqlite")]
    let store: Arc<dyn DocumentStore> = Arc::new(
        SqliteStore::open(&options.account_endpoint, options.resource_path()).await?,
    );

    #[cfg(feature = "dynamodb")]
    let store: Arc<dyn DocumentStore> = Arc::new(DynamoDbStore::connect(options).await?);

    #[cfg(not(any(feature = "sqlite", feature = "dynamodb")))]
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new(options.resource_path()));

    tracing::info!(backend = store.describe(), "Document store ready");

    Ok(store)
}
