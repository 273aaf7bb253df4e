//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of `DocumentStore`
//! using `aws-sdk-dynamodb`. Each container maps to one table named
//! `{database}.{container}` with `PK` (partition) and `SK` (document id) keys.

mod conversions;
mod error;
mod keys;
mod store;

pub use store::DynamoDbStore;
