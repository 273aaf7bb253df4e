//! In-memory document store implementation.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use docpersist_core::storage::metadata::{self, document_id_in};
use docpersist_core::storage::{
    bare_parameter_name, ContinuationToken, DocumentStore, PageRequest, Query, QueryPage,
    ResourcePath, Result, StoreError,
};

/// Items of one partition, kept in insertion order.
#[derive(Debug, Default)]
struct Partition {
    /// Insertion sequence -> item.
    items: BTreeMap<u64, Value>,
    /// Item id -> insertion sequence.
    index: HashMap<String, u64>,
}

#[derive(Debug, Default)]
struct State {
    partitions: HashMap<String, Partition>,
    next_sequence: u64,
}

/// In-memory storage backend for testing.
///
/// Data is not persisted and will be lost when the last clone is dropped.
/// Queries support the match-all text only; parameters are applied as
/// equality filters on top-level fields.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    path: ResourcePath,
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new(path: ResourcePath) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Number of documents across all partitions.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state.partitions.values().map(|p| p.items.len()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn matches_parameters(item: &Value, query: &Query) -> bool {
    query
        .parameters()
        .iter()
        .all(|(name, expected)| item.get(bare_parameter_name(name)) == Some(expected))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn describe(&self) -> &'static str {
        "inmemory"
    }

    async fn create_item(&self, partition: &str, mut item: Value) -> Result<Value> {
        let id = document_id_in(&item, partition)?;

        let mut state = self.state.write().await;
        if state
            .partitions
            .get(partition)
            .is_some_and(|p| p.index.contains_key(&id))
        {
            return Err(StoreError::conflict(id, partition));
        }

        metadata::stamp(&mut item, &self.path, &metadata::new_resource_id(), Utc::now())?;

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let entry = state.partitions.entry(partition.to_string()).or_default();
        entry.index.insert(id, sequence);
        entry.items.insert(sequence, item.clone());

        Ok(item)
    }

    async fn read_item(&self, id: &str, partition: &str) -> Result<Option<Value>> {
        let state = self.state.read().await;
        Ok(state.partitions.get(partition).and_then(|p| {
            p.index
                .get(id)
                .and_then(|sequence| p.items.get(sequence))
                .cloned()
        }))
    }

    async fn replace_item(
        &self,
        partition: &str,
        mut item: Value,
        if_match: Option<&str>,
    ) -> Result<Value> {
        let id = document_id_in(&item, partition)?;

        let mut state = self.state.write().await;
        let entry = state
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::not_found(&id, partition))?;
        let sequence = *entry
            .index
            .get(&id)
            .ok_or_else(|| StoreError::not_found(&id, partition))?;
        let existing = entry
            .items
            .get(&sequence)
            .ok_or_else(|| StoreError::not_found(&id, partition))?;

        if let Some(expected) = if_match {
            if metadata::etag_of(existing) != Some(expected) {
                return Err(StoreError::precondition_failed(id, expected));
            }
        }

        let resource_id = metadata::resource_id_of(existing)
            .map(str::to_string)
            .unwrap_or_else(metadata::new_resource_id);
        metadata::stamp(&mut item, &self.path, &resource_id, Utc::now())?;

        entry.items.insert(sequence, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: &str, partition: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::not_found(id, partition))?;
        let sequence = entry
            .index
            .remove(id)
            .ok_or_else(|| StoreError::not_found(id, partition))?;
        entry.items.remove(&sequence);
        Ok(())
    }

    async fn query_items(
        &self,
        partition: &str,
        query: &Query,
        page: PageRequest,
    ) -> Result<QueryPage> {
        if !query.is_match_all() {
            return Err(StoreError::InvalidQuery(format!(
                "The in-memory store only supports '{}', got '{}'",
                docpersist_core::storage::MATCH_ALL_QUERY,
                query.text()
            )));
        }

        let after = match &page.continuation {
            Some(token) => Bound::Excluded(token.decode::<u64>()?),
            None => Bound::Unbounded,
        };

        let state = self.state.read().await;
        let Some(entry) = state.partitions.get(partition) else {
            return Ok(QueryPage::default());
        };

        // One extra item tells us whether another page exists.
        let mut matched: Vec<(u64, &Value)> = entry
            .items
            .range((after, Bound::Unbounded))
            .filter(|(_, item)| matches_parameters(item, query))
            .take(page.max_item_count + 1)
            .map(|(sequence, item)| (*sequence, item))
            .collect();

        let continuation = if matched.len() > page.max_item_count {
            matched.truncate(page.max_item_count);
            match matched.last() {
                Some((sequence, _)) => Some(ContinuationToken::encode(sequence)?),
                None => None,
            }
        } else {
            None
        };

        let items = matched.into_iter().map(|(_, item)| item.clone()).collect();
        Ok(QueryPage::new(items, continuation))
    }
}
