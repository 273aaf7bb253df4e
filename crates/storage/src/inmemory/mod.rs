//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the `DocumentStore`
//! trait that keeps every partition in maps wrapped in `Arc<RwLock<_>>`. This
//! is useful for testing and development scenarios where persistence is not
//! required.
//!
//! # Example
//!
//! ```rust,ignore
//! use docpersist_core::storage::ResourcePath;
//! use docpersist_storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new(ResourcePath::new("samples", "documents"));
//! // Use store for testing...
//! ```

mod store;

pub use store::InMemoryStore;
