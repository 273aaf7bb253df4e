//! CLI command definitions.

pub mod documents;
pub mod store;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

pub use documents::{parse_param, read_document};
pub use store::StoreArgs;

/// CLI for docpersist document stores.
#[derive(Debug, Parser)]
#[command(name = "docpersist")]
#[command(about = "Store and query JSON documents", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Insert a new document.
    Insert {
        /// JSON document, `@path` to read a file, or `-` for stdin.
        document: String,
        /// Partition (`type`) to store the document under.
        #[arg(long = "type")]
        document_type: Option<String>,
    },
    /// Get a document by partition and ID.
    Get {
        /// Partition (`type`) of the document.
        partition: String,
        /// Document ID.
        id: Uuid,
    },
    /// Replace a stored document.
    Update {
        /// JSON document, `@path` to read a file, or `-` for stdin.
        document: String,
    },
    /// Delete a document by partition and ID.
    Delete {
        /// Partition (`type`) of the document.
        partition: String,
        /// Document ID.
        id: Uuid,
        /// Succeed when the document does not exist.
        #[arg(long)]
        ignore_missing: bool,
    },
    /// List the documents of a partition.
    Query {
        /// Partition (`type`) to enumerate.
        partition: String,
        /// Backend query text. Empty matches every document.
        #[arg(long, default_value = "")]
        query: String,
        /// Query parameter as `name=value`; values are parsed as JSON when possible.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,
    },
}
