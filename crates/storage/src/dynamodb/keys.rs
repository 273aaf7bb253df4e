//! DynamoDB key functions.
//!
//! Pure functions for table names, primary keys and continuation cursors.
//! All functions are sync and have no side effects.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};

use docpersist_core::storage::{ContinuationToken, ResourcePath, Result, StoreError};

pub const PARTITION_KEY: &str = "PK";
pub const SORT_KEY: &str = "SK";

/// Generate the table name for a container.
///
/// Pattern: `<database_id>.<container_id>`
pub fn table_name(path: &ResourcePath) -> String {
    format!("{}.{}", path.database_id, path.container_id)
}

/// Generate the primary key attributes of a document.
pub fn primary_key(partition: &str, id: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(partition.to_string()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(id.to_string())),
    ])
}

/// Cursor carried inside a continuation token.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct StartKey {
    pk: String,
    sk: String,
}

/// Encode a `LastEvaluatedKey` as a continuation token.
pub fn encode_start_key(key: &HashMap<String, AttributeValue>) -> Result<ContinuationToken> {
    let cursor = StartKey {
        pk: key_string(key, PARTITION_KEY)?,
        sk: key_string(key, SORT_KEY)?,
    };
    ContinuationToken::encode(&cursor)
}

/// Decode a continuation token into an `ExclusiveStartKey`.
pub fn decode_start_key(token: &ContinuationToken) -> Result<HashMap<String, AttributeValue>> {
    let cursor: StartKey = token.decode()?;
    Ok(primary_key(&cursor.pk, &cursor.sk))
}

fn key_string(key: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    match key.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        _ => Err(StoreError::InvalidData(format!(
            "Last evaluated key is missing string attribute {name}"
        ))),
    }
}
