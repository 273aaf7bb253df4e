use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{Result, StoreError};

/// Query text that selects every document in a partition.
pub const MATCH_ALL_QUERY: &str = "SELECT * FROM c";

/// A query in the store's native dialect plus its named parameters.
///
/// The text is passed to the backend untouched. An empty text and
/// [`MATCH_ALL_QUERY`] are understood by every backend as "all documents".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    text: String,
    parameters: BTreeMap<String, Value>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// A query selecting every document in the partition.
    pub fn all() -> Self {
        Self::new(MATCH_ALL_QUERY)
    }

    /// Adds a named parameter. A later value for the same name replaces the earlier one.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Returns true when the text selects everything (empty or `SELECT * FROM c`,
    /// compared case-insensitively and ignoring extra whitespace).
    pub fn is_match_all(&self) -> bool {
        let normalized = self
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        normalized.is_empty() || normalized.eq_ignore_ascii_case(MATCH_ALL_QUERY)
    }
}

/// Strips the `@` or `:` sigil from a parameter name.
pub fn bare_parameter_name(name: &str) -> &str {
    name.trim_start_matches(['@', ':'])
}

/// Opaque cursor pointing at the next page of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encodes a backend cursor as URL-safe base64 JSON.
    pub fn encode<T: Serialize>(cursor: &T) -> Result<Self> {
        let json = serde_json::to_vec(cursor)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decodes a cursor previously produced by [`ContinuationToken::encode`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|e| StoreError::InvalidQuery(format!("Malformed continuation token: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::InvalidQuery(format!("Malformed continuation token: {e}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Upper bound on items returned in the page.
    pub max_item_count: usize,
    /// Where to resume; `None` starts from the beginning.
    pub continuation: Option<ContinuationToken>,
}

impl PageRequest {
    pub fn first(max_item_count: usize) -> Self {
        Self {
            max_item_count,
            continuation: None,
        }
    }

    pub fn after(max_item_count: usize, continuation: ContinuationToken) -> Self {
        Self {
            max_item_count,
            continuation: Some(continuation),
        }
    }
}

/// One page of query results.
///
/// A page may be empty and still carry a continuation token, for example when
/// a backend filters items after reading them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPage {
    pub items: Vec<Value>,
    pub continuation: Option<ContinuationToken>,
}

impl QueryPage {
    pub fn new(items: Vec<Value>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            items,
            continuation,
        }
    }

    /// Returns true when no further pages exist.
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }
}
