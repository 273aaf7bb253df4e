use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Fields shared by every persisted document.
///
/// `id` and `document_type` are supplied by the caller. The remaining fields
/// are assigned by the store on every successful write and are `None` on a
/// freshly constructed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBase {
    pub id: Uuid,
    /// Discriminator that doubles as the partition key.
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(rename = "_rid", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(rename = "_self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attachments_link: Option<String>,
    #[serde(
        rename = "_ts",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DocumentBase {
    /// Creates a new, not yet stored, document base with a random ID.
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_type: document_type.into(),
            resource_id: None,
            self_link: None,
            etag: None,
            attachments_link: None,
            timestamp: None,
        }
    }

    /// Sets a specific ID (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Returns true when every store-assigned field is populated.
    pub fn is_stored(&self) -> bool {
        let non_empty = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        non_empty(&self.resource_id)
            && non_empty(&self.self_link)
            && non_empty(&self.etag)
            && non_empty(&self.attachments_link)
            && self.timestamp.is_some()
    }
}

/// A value the document client can persist.
///
/// Implementors embed a [`DocumentBase`] (usually with `#[serde(flatten)]`)
/// and expose it through [`Document::base`]. Everything else is opaque to
/// the client and serialized as-is.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn base(&self) -> &DocumentBase;

    fn id(&self) -> Uuid {
        self.base().id
    }

    /// The partition the document lives in.
    fn partition_id(&self) -> &str {
        &self.base().document_type
    }

    fn etag(&self) -> Option<&str> {
        self.base().etag.as_deref()
    }
}

impl Document for DocumentBase {
    fn base(&self) -> &DocumentBase {
        self
    }
}
