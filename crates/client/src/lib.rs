//! docpersist_client - document client façade and CLI for docpersist.

pub mod cli;
pub mod client;
pub mod error;
pub mod output;
pub mod raw;

pub use client::DocumentClient;
pub use error::{ClientError, Result};
pub use raw::RawDocument;
pub use tokio_util::sync::CancellationToken;
