use async_trait::async_trait;
use serde_json::Value;

use super::{PageRequest, Query, QueryPage, Result};

/// Primitives of an external document store.
///
/// Items are JSON objects carrying at least `id` and `type`; `type` is the
/// partition key. Every successful write returns the item as persisted, with
/// store-assigned metadata (`_rid`, `_self`, `_etag`, `_attachments`, `_ts`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs.
    fn describe(&self) -> &'static str;

    /// Creates an item. Fails with `Conflict` if the id already exists in the partition.
    async fn create_item(&self, partition: &str, item: Value) -> Result<Value>;

    /// Reads an item by id and partition. Returns `None` when absent.
    async fn read_item(&self, id: &str, partition: &str) -> Result<Option<Value>>;

    /// Replaces an existing item.
    ///
    /// Fails with `NotFound` if the item does not exist and with
    /// `PreconditionFailed` if `if_match` is given and differs from the stored etag.
    async fn replace_item(
        &self,
        partition: &str,
        item: Value,
        if_match: Option<&str>,
    ) -> Result<Value>;

    /// Deletes an item. Fails with `NotFound` if it does not exist.
    async fn delete_item(&self, id: &str, partition: &str) -> Result<()>;

    /// Fetches one page of a query scoped to a partition.
    async fn query_items(
        &self,
        partition: &str,
        query: &Query,
        page: PageRequest,
    ) -> Result<QueryPage>;
}
