//! docpersist_core - document model, store traits and options for docpersist.

pub mod document;
pub mod options;
pub mod storage;

pub use document::{Document, DocumentBase};
pub use options::{ConcurrencyMode, DocumentClientOptions, OptionsError};
