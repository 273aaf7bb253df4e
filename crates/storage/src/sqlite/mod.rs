//! SQLite storage backend implementation.
//!
//! This module provides a SQLite-based implementation of the `DocumentStore`
//! trait using `rusqlite` and `tokio-rusqlite`. Documents are stored as JSON
//! text; query predicates are plain SQL over the `body` column.

mod conversions;
mod error;
mod schema;
mod store;

pub use store::SqliteStore;
