//! Store-assigned document metadata.
//!
//! Pure functions that every backend uses to stamp `_rid`, `_self`, `_etag`,
//! `_attachments` and `_ts` onto a JSON document and to read its key fields.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Result, StoreError};

pub const ID_FIELD: &str = "id";
pub const TYPE_FIELD: &str = "type";
pub const RESOURCE_ID_FIELD: &str = "_rid";
pub const SELF_LINK_FIELD: &str = "_self";
pub const ETAG_FIELD: &str = "_etag";
pub const ATTACHMENTS_FIELD: &str = "_attachments";
pub const TIMESTAMP_FIELD: &str = "_ts";

pub const ATTACHMENTS_LINK: &str = "attachments/";

/// Database and container a backend stores documents in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub database_id: String,
    pub container_id: String,
}

impl ResourcePath {
    pub fn new(database_id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            container_id: container_id.into(),
        }
    }

    /// Pattern: `dbs/<database>/colls/<container>/docs/<id>`
    pub fn document_link(&self, id: &str) -> String {
        format!(
            "dbs/{}/colls/{}/docs/{}",
            self.database_id, self.container_id, id
        )
    }
}

/// Generates a resource id for a newly created document.
pub fn new_resource_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generates a fresh quoted etag.
pub fn new_etag() -> String {
    format!("\"{}\"", Uuid::new_v4())
}

/// Reads the `(id, partition)` pair of a document.
pub fn document_key(item: &Value) -> Result<(String, String)> {
    let id = string_field(item, ID_FIELD)
        .ok_or_else(|| StoreError::InvalidData("Document is missing 'id'".to_string()))?;
    let partition = string_field(item, TYPE_FIELD)
        .ok_or_else(|| StoreError::InvalidData("Document is missing 'type'".to_string()))?;

    if id.is_empty() || partition.is_empty() {
        return Err(StoreError::InvalidData(
            "Document 'id' and 'type' must not be empty".to_string(),
        ));
    }

    Ok((id.to_string(), partition.to_string()))
}

/// Reads the id of a document and checks that it belongs to `partition`.
pub fn document_id_in(item: &Value, partition: &str) -> Result<String> {
    let (id, item_partition) = document_key(item)?;
    if item_partition != partition {
        return Err(StoreError::InvalidData(format!(
            "Document {id} has type '{item_partition}' but was sent to partition '{partition}'"
        )));
    }
    Ok(id)
}

pub fn etag_of(item: &Value) -> Option<&str> {
    string_field(item, ETAG_FIELD)
}

pub fn resource_id_of(item: &Value) -> Option<&str> {
    string_field(item, RESOURCE_ID_FIELD)
}

/// Overwrites all store-assigned fields of `item`.
///
/// Returns the new etag.
pub fn stamp(
    item: &mut Value,
    path: &ResourcePath,
    resource_id: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let (id, _) = document_key(item)?;
    let etag = new_etag();

    let object = item
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidData("Document must be a JSON object".to_string()))?;

    object.insert(
        RESOURCE_ID_FIELD.to_string(),
        Value::String(resource_id.to_string()),
    );
    object.insert(
        SELF_LINK_FIELD.to_string(),
        Value::String(path.document_link(&id)),
    );
    object.insert(ETAG_FIELD.to_string(), Value::String(etag.clone()));
    object.insert(
        ATTACHMENTS_FIELD.to_string(),
        Value::String(ATTACHMENTS_LINK.to_string()),
    );
    object.insert(TIMESTAMP_FIELD.to_string(), Value::from(now.timestamp()));

    Ok(etag)
}

fn string_field<'a>(item: &'a Value, field: &str) -> Option<&'a str> {
    item.get(field).and_then(Value::as_str)
}
