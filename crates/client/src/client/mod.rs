//! Typed document client over a `DocumentStore`.

pub mod documents;
pub mod enumerate;

use std::future::Future;
use std::sync::Arc;

use docpersist_core::options::DocumentClientOptions;
use docpersist_core::storage::{
    store_error_to_status_code, DocumentStore, Result as StoreResult, StoreError,
};
use docpersist_core::Document;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Document client façade.
///
/// Cheap to clone; clones share the underlying store connection.
#[derive(Clone)]
pub struct DocumentClient {
    store: Arc<dyn DocumentStore>,
    options: Arc<DocumentClientOptions>,
}

impl std::fmt::Debug for DocumentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentClient")
            .field("backend", &self.store.describe())
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentClient {
    /// Create a client over an existing store.
    pub fn new(store: Arc<dyn DocumentStore>, options: DocumentClientOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            store,
            options: Arc::new(options),
        })
    }

    /// Open the store selected at compile time and wrap it in a client.
    pub async fn connect(options: DocumentClientOptions) -> Result<Self> {
        options.validate()?;
        let store = docpersist_storage::connect(&options).await?;
        Self::new(store, options)
    }

    /// Get the client options.
    pub fn options(&self) -> &DocumentClientOptions {
        &self.options
    }

    /// Name of the backing store.
    pub fn backend(&self) -> &'static str {
        self.store.describe()
    }

    /// Run a read-only store call unless `cancel` fires first.
    ///
    /// The token is checked before the call starts and raced against it
    /// while it runs. Only reads go through here: dropping them leaves
    /// nothing behind in the store.
    async fn cancellable<T>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        check_cancel(operation, cancel)?;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(operation, "Operation canceled");
                Err(StoreError::Canceled)
            }
            result = call => result,
        };
        log_failure(operation, result)
    }

    /// Run a store write unless `cancel` fired before it was issued.
    ///
    /// Once issued, the write runs to completion and its own result is
    /// returned, since the store may already have committed it.
    async fn write<T>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        check_cancel(operation, cancel)?;

        let result = call.await;
        if cancel.is_cancelled() {
            tracing::debug!(operation, "Cancel requested after the write was issued");
        }
        log_failure(operation, result)
    }
}

fn check_cancel(operation: &'static str, cancel: &CancellationToken) -> StoreResult<()> {
    if cancel.is_cancelled() {
        tracing::warn!(operation, "Operation canceled before it started");
        return Err(StoreError::Canceled);
    }
    Ok(())
}

fn log_failure<T>(operation: &'static str, result: StoreResult<T>) -> StoreResult<T> {
    if let Err(err) = &result {
        tracing::debug!(
            operation,
            status = store_error_to_status_code(err),
            error = %err,
            "Store call failed"
        );
    }
    result
}

/// Serialize a document for the store.
fn to_item<D: Document>(document: &D) -> StoreResult<Value> {
    Ok(serde_json::to_value(document)?)
}

/// Deserialize a stored item, rejecting items without store metadata.
fn from_item<D: Document>(item: Value) -> StoreResult<D> {
    let document: D = serde_json::from_value(item)?;
    if !document.base().is_stored() {
        return Err(StoreError::InvalidData(format!(
            "Store returned document {} without metadata",
            document.id()
        )));
    }
    Ok(document)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use docpersist_core::storage::ResourcePath;
    use docpersist_storage::InMemoryStore;
    use serde_json::json;

    #[test]
    fn test_new_validates_options() {
        let store = Arc::new(InMemoryStore::new(ResourcePath::new("samples", "documents")));
        let options = DocumentClientOptions::new("samples", "documents").with_items_per_request(0);

        let result = DocumentClient::new(store, options);

        assert!(matches!(
            result,
            Err(crate::ClientError::Options(_))
        ));
    }

    #[test]
    fn test_debug_hides_account_key() {
        let client = client_with(options().with_key("super-secret"));
        let output = format!("{client:?}");
        assert!(output.contains("inmemory"));
        assert!(!output.contains("super-secret"));
    }

    #[test]
    fn test_from_item_rejects_missing_metadata() {
        let item = serde_json::to_value(TestDocument::new("a")).unwrap();

        let result = from_item::<TestDocument>(item);

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_cancellable_with_cancelled_token() {
        let client = client();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client
            .cancellable("test", &cancel, async { Ok(json!(1)) })
            .await;

        assert_eq!(result, Err(StoreError::Canceled));
    }

    #[tokio::test]
    async fn test_cancellable_drops_pending_call() {
        let client = client();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let result: StoreResult<()> = client
            .cancellable("test", &cancel, std::future::pending())
            .await;

        assert_eq!(result, Err(StoreError::Canceled));
    }
}
