//! Point operations: insert, read, update and delete.

use docpersist_core::options::ConcurrencyMode;
use docpersist_core::storage::Result;
use docpersist_core::Document;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{from_item, to_item, DocumentClient};

impl DocumentClient {
    /// Insert a new document.
    ///
    /// Returns the stored copy with metadata populated. Fails with
    /// `Conflict` when the id already exists in the document's partition.
    pub async fn insert<D: Document>(&self, document: &D, cancel: &CancellationToken) -> Result<D> {
        let partition = document.partition_id();
        tracing::debug!(
            id = %document.id(),
            partition,
            backend = self.backend(),
            "Inserting document"
        );

        let item = to_item(document)?;
        let stored = self
            .write("insert", cancel, self.store.create_item(partition, item))
            .await?;

        from_item(stored)
    }

    /// Read a document by id, or `None` when it does not exist.
    pub async fn first_or_default<D: Document>(
        &self,
        id: Uuid,
        partition_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<D>> {
        tracing::debug!(%id, partition = partition_id, backend = self.backend(), "Reading document");

        let id = id.to_string();
        let item = self
            .cancellable(
                "first_or_default",
                cancel,
                self.store.read_item(&id, partition_id),
            )
            .await?;

        item.map(from_item).transpose()
    }

    /// Replace a stored document as a whole.
    ///
    /// Under optimistic concurrency the document's etag is sent as an if-match
    /// precondition, so a stale copy fails with `PreconditionFailed`.
    pub async fn update<D: Document>(&self, document: &D, cancel: &CancellationToken) -> Result<D> {
        let partition = document.partition_id();
        let if_match = match self.options.concurrency {
            ConcurrencyMode::Optimistic => document.etag(),
            ConcurrencyMode::LastWriterWins => None,
        };
        tracing::debug!(
            id = %document.id(),
            partition,
            if_match,
            backend = self.backend(),
            "Updating document"
        );

        let item = to_item(document)?;
        let stored = self
            .write(
                "update",
                cancel,
                self.store.replace_item(partition, item, if_match),
            )
            .await
            .inspect_err(|err| {
                if matches!(err, docpersist_core::storage::StoreError::PreconditionFailed { .. }) {
                    tracing::warn!(id = %document.id(), partition, "Update rejected: stale etag");
                }
            })?;

        from_item(stored)
    }

    /// Delete a document. Fails with `NotFound` when it does not exist.
    pub async fn delete(
        &self,
        id: Uuid,
        partition_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        tracing::debug!(%id, partition = partition_id, backend = self.backend(), "Deleting document");

        let id = id.to_string();
        self.write("delete", cancel, self.store.delete_item(&id, partition_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use docpersist_core::options::ConcurrencyMode;
    use docpersist_core::storage::{
        DocumentStore, PageRequest, Query, QueryPage, ResourcePath, Result, StoreError,
    };
    use docpersist_storage::InMemoryStore;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;

    use super::super::testing::*;
    use super::super::DocumentClient;

    /// Commits writes to an in-memory store, then holds the reply back.
    struct SlowAckStore {
        inner: InMemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for SlowAckStore {
        fn describe(&self) -> &'static str {
            "slow-ack"
        }

        async fn create_item(&self, partition: &str, item: Value) -> Result<Value> {
            let stored = self.inner.create_item(partition, item).await;
            tokio::time::sleep(self.delay).await;
            stored
        }

        async fn read_item(&self, id: &str, partition: &str) -> Result<Option<Value>> {
            self.inner.read_item(id, partition).await
        }

        async fn replace_item(
            &self,
            partition: &str,
            item: Value,
            if_match: Option<&str>,
        ) -> Result<Value> {
            let stored = self.inner.replace_item(partition, item, if_match).await;
            tokio::time::sleep(self.delay).await;
            stored
        }

        async fn delete_item(&self, id: &str, partition: &str) -> Result<()> {
            let deleted = self.inner.delete_item(id, partition).await;
            tokio::time::sleep(self.delay).await;
            deleted
        }

        async fn query_items(
            &self,
            partition: &str,
            query: &Query,
            page: PageRequest,
        ) -> Result<QueryPage> {
            self.inner.query_items(partition, query, page).await
        }
    }

    fn slow_ack_client() -> DocumentClient {
        let store = SlowAckStore {
            inner: InMemoryStore::new(ResourcePath::new("samples", "documents")),
            delay: Duration::from_millis(50),
        };
        DocumentClient::new(Arc::new(store), options()).unwrap()
    }

    fn cancel_after(cancel: &CancellationToken, delay: Duration) {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trigger.cancel();
        });
    }

    #[tokio::test]
    async fn test_insert_first_update_delete() {
        let client = client();
        let cancel = CancellationToken::new();

        let creating = TestDocument::new("a");
        let created = client.insert(&creating, &cancel).await.unwrap();

        creating.assert_same_content(&created);
        assert!(created.base.is_stored());
        assert!(!creating.base.is_stored());
        assert_eq!(
            created.base.self_link.as_deref(),
            Some(format!("dbs/samples/colls/documents/docs/{}", created.base.id).as_str())
        );

        let received: TestDocument = client
            .first_or_default(created.base.id, PARTITION, &cancel)
            .await
            .unwrap()
            .unwrap();
        created.assert_same_content(&received);
        assert_eq!(received.base, created.base);

        let mut updating = received.clone();
        updating.string_property = "b".to_string();
        updating.embedded_property.int_property = 20;
        let updated = client.update(&updating, &cancel).await.unwrap();

        updating.assert_same_content(&updated);
        assert_ne!(updated.base.etag, received.base.etag);
        assert_eq!(updated.base.resource_id, received.base.resource_id);

        let received: TestDocument = client
            .first_or_default(created.base.id, PARTITION, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.string_property, "b");
        assert_eq!(received.base.etag, updated.base.etag);

        client
            .delete(created.base.id, PARTITION, &cancel)
            .await
            .unwrap();

        let received: Option<TestDocument> = client
            .first_or_default(created.base.id, PARTITION, &cancel)
            .await
            .unwrap();
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_conflicts() {
        let client = client();
        let cancel = CancellationToken::new();
        let document = TestDocument::new("a");

        client.insert(&document, &cancel).await.unwrap();
        let result = client.insert(&document, &cancel).await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_same_id_in_other_partition() {
        let client = client();
        let cancel = CancellationToken::new();
        let document = TestDocument::new("a");
        let mut other = document.clone();
        other.base.document_type = "OtherDocument".to_string();

        client.insert(&document, &cancel).await.unwrap();
        client.insert(&other, &cancel).await.unwrap();

        let missing: Option<TestDocument> = client
            .first_or_default(document.base.id, "ThirdDocument", &cancel)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_stale_update_fails_under_optimistic_concurrency() {
        let client = client();
        let cancel = CancellationToken::new();
        let created = client
            .insert(&TestDocument::new("a"), &cancel)
            .await
            .unwrap();

        let mut first = created.clone();
        first.string_property = "b".to_string();
        client.update(&first, &cancel).await.unwrap();

        let mut second = created.clone();
        second.string_property = "c".to_string();
        let result = client.update(&second, &cancel).await;

        assert!(matches!(
            result,
            Err(StoreError::PreconditionFailed { .. })
        ));
        let stored: TestDocument = client
            .first_or_default(created.base.id, PARTITION, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.string_property, "b");
    }

    #[tokio::test]
    async fn test_stale_update_wins_under_last_writer_wins() {
        let client = client_with(options().with_concurrency(ConcurrencyMode::LastWriterWins));
        let cancel = CancellationToken::new();
        let created = client
            .insert(&TestDocument::new("a"), &cancel)
            .await
            .unwrap();

        let mut first = created.clone();
        first.string_property = "b".to_string();
        client.update(&first, &cancel).await.unwrap();

        let mut second = created.clone();
        second.string_property = "c".to_string();
        let updated = client.update(&second, &cancel).await.unwrap();

        assert_eq!(updated.string_property, "c");
        let stored: TestDocument = client
            .first_or_default(created.base.id, PARTITION, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.string_property, "c");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let client = client();
        let cancel = CancellationToken::new();

        let result = client.update(&TestDocument::new("a"), &cancel).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_document() {
        let client = client();
        let cancel = CancellationToken::new();

        let err = client
            .delete(uuid::Uuid::new_v4(), PARTITION, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cancelled_insert_has_no_side_effects() {
        let client = client();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let document = TestDocument::new("a");

        let result = client.insert(&document, &cancel).await;

        assert_eq!(result.unwrap_err(), StoreError::Canceled);
        let stored: Option<TestDocument> = client
            .first_or_default(document.base.id, PARTITION, &CancellationToken::new())
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_insert_committed_before_cancel_reports_success() {
        let client = slow_ack_client();
        let cancel = CancellationToken::new();
        let document = TestDocument::new("a");
        cancel_after(&cancel, Duration::from_millis(10));

        let stored = client.insert(&document, &cancel).await.unwrap();

        assert!(cancel.is_cancelled());
        document.assert_same_content(&stored);
        let received: Option<TestDocument> = client
            .first_or_default(document.base.id, PARTITION, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(received, Some(stored));
    }

    #[tokio::test]
    async fn test_delete_committed_before_cancel_reports_success() {
        let client = slow_ack_client();
        let created = client
            .insert(&TestDocument::new("a"), &CancellationToken::new())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel_after(&cancel, Duration::from_millis(10));

        client
            .delete(created.base.id, PARTITION, &cancel)
            .await
            .unwrap();

        let received: Option<TestDocument> = client
            .first_or_default(created.base.id, PARTITION, &CancellationToken::new())
            .await
            .unwrap();
        assert!(received.is_none());
    }
}
