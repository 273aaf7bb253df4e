//! Lazy, paginated enumeration of a partition.

use std::collections::HashMap;
use std::sync::Arc;

use docpersist_core::storage::{PageRequest, Query, Result, StoreError};
use docpersist_core::Document;
use futures_core::Stream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{from_item, DocumentClient};

impl DocumentClient {
    /// Enumerate the documents of a partition that match `query`.
    ///
    /// Pages of at most `items_per_request` items are requested one at a time
    /// as the stream is polled. Cancellation is checked before every page
    /// request. The stream ends after yielding an error.
    pub fn enumerate<D: Document>(
        &self,
        partition_id: &str,
        query: Query,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = Result<D>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let partition = partition_id.to_string();
        let cancel = cancel.clone();
        let page_size = self.options.items_per_request;

        async_stream::stream! {
            let mut continuation = None;
            let mut page_number = 0usize;

            'pages: loop {
                if cancel.is_cancelled() {
                    tracing::warn!(partition = %partition, page_number, "Enumeration canceled");
                    yield Err(StoreError::Canceled);
                    break;
                }

                let request = match continuation.take() {
                    Some(token) => PageRequest::after(page_size, token),
                    None => PageRequest::first(page_size),
                };
                tracing::debug!(
                    partition = %partition,
                    page_number,
                    backend = store.describe(),
                    "Requesting page"
                );

                let page = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(StoreError::Canceled),
                    page = store.query_items(&partition, &query, request) => page,
                };

                let page = match page {
                    Ok(page) => page,
                    Err(err) => {
                        if err == StoreError::Canceled {
                            tracing::warn!(partition = %partition, page_number, "Enumeration canceled");
                        }
                        yield Err(err);
                        break;
                    }
                };

                for item in page.items {
                    match from_item::<D>(item) {
                        Ok(document) => yield Ok(document),
                        Err(err) => {
                            yield Err(err);
                            break 'pages;
                        }
                    }
                }

                match page.continuation {
                    Some(token) => continuation = Some(token),
                    None => break,
                }
                page_number += 1;
            }
        }
    }

    /// Collect every matching document into a list, in store order.
    pub async fn to_list<D: Document>(
        &self,
        partition_id: &str,
        query: Query,
        cancel: &CancellationToken,
    ) -> Result<Vec<D>> {
        let stream = self.enumerate::<D>(partition_id, query, cancel);
        tokio::pin!(stream);

        let mut documents = Vec::new();
        while let Some(document) = stream.next().await {
            documents.push(document?);
        }
        Ok(documents)
    }

    /// Collect every matching document into a map keyed by id.
    ///
    /// A repeated id fails with `InvalidData`.
    pub async fn to_map<D: Document>(
        &self,
        partition_id: &str,
        query: Query,
        cancel: &CancellationToken,
    ) -> Result<HashMap<Uuid, D>> {
        let stream = self.enumerate::<D>(partition_id, query, cancel);
        tokio::pin!(stream);

        let mut documents = HashMap::new();
        while let Some(document) = stream.next().await {
            let document = document?;
            let id = document.id();
            if documents.insert(id, document).is_some() {
                return Err(StoreError::InvalidData(format!(
                    "Document {id} was returned more than once"
                )));
            }
        }
        Ok(documents)
    }
}
