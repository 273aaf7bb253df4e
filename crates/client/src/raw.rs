//! Schemaless documents.

use docpersist_core::{Document, DocumentBase};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

/// A document whose fields beyond [`DocumentBase`] are kept as raw JSON.
///
/// The CLI uses it to persist arbitrary JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawDocument {
    /// Builds a document from a JSON object.
    ///
    /// A missing `id` is generated and `document_type`, when given, replaces
    /// the object's `type`.
    pub fn from_value(mut value: Value, document_type: Option<&str>) -> Result<Self> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| ClientError::InvalidInput("Document must be a JSON object".to_string()))?;

        if !object.contains_key("id") {
            object.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if let Some(document_type) = document_type {
            object.insert("type".to_string(), Value::String(document_type.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }
}

impl Document for RawDocument {
    fn base(&self) -> &DocumentBase {
        &self.base
    }
}
