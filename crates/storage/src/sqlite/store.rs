//! SQLite document store implementation.
//!
//! Implements `DocumentStore` from `docpersist_core::storage` using SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::OptionalExtension;
use serde_json::Value;
use tokio_rusqlite::Connection;

use docpersist_core::storage::metadata::{self, document_id_in};
use docpersist_core::storage::{
    ContinuationToken, DocumentStore, PageRequest, Query, QueryPage, ResourcePath, Result,
    StoreError,
};

use super::conversions::{equality_predicate, parse_body, query_parameters};
use super::error::{
    map_query_error, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_key,
};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Result of a replace attempt, decided inside the write transaction.
enum ReplaceOutcome {
    Replaced(Value),
    Missing,
    Stale,
}

/// SQLite-based document store.
///
/// All containers share one `documents` table; rows are scoped by the
/// `database/container` pair of the store's resource path.
pub struct SqliteStore {
    conn: Connection,
    path: ResourcePath,
    container: String,
}

impl SqliteStore {
    /// Opens a file-based database, creating it and its schema if needed.
    ///
    /// An empty path or `:memory:` opens an in-memory database.
    pub async fn open(db_path: &str, path: ResourcePath) -> Result<Self> {
        let conn = if db_path.is_empty() || db_path == ":memory:" {
            Connection::open_in_memory().await
        } else {
            Connection::open(db_path).await
        }
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        let container = format!("{}/{}", path.database_id, path.container_id);
        Ok(Self {
            conn,
            path,
            container,
        })
    }

    /// Creates a store over an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn open_in_memory(path: ResourcePath) -> Result<Self> {
        Self::open(":memory:", path).await
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(map_tokio_rusqlite_error)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn describe(&self) -> &'static str {
        "sqlite"
    }

    async fn create_item(&self, partition: &str, mut item: Value) -> Result<Value> {
        let id = document_id_in(&item, partition)?;
        let resource_id = metadata::new_resource_id();
        let etag = metadata::stamp(&mut item, &self.path, &resource_id, Utc::now())?;
        let body = serde_json::to_string(&item)?;

        let container = self.container.clone();
        let partition_key = partition.to_string();
        let row_id = id.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_DOCUMENT,
                    rusqlite::params![container, partition_key, row_id, resource_id, etag, body],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_key(e, &id, partition))?;

        Ok(item)
    }

    async fn read_item(&self, id: &str, partition: &str) -> Result<Option<Value>> {
        let container = self.container.clone();
        let partition_key = partition.to_string();
        let row_id = id.to_string();

        let body: Option<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_DOCUMENT).map_err(wrap_err)?;
                stmt.query_row([&container, &partition_key, &row_id], |row| row.get(0))
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_key(e, id, partition))?;

        body.as_deref().map(parse_body).transpose()
    }

    async fn replace_item(
        &self,
        partition: &str,
        mut item: Value,
        if_match: Option<&str>,
    ) -> Result<Value> {
        let id = document_id_in(&item, partition)?;
        // Stamped with a placeholder resource id; the stored one is restored below.
        let etag = metadata::stamp(&mut item, &self.path, "", Utc::now())?;

        let container = self.container.clone();
        let partition_key = partition.to_string();
        let row_id = id.clone();
        let expected_etag = if_match.map(str::to_string);

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let current: Option<(String, String)> = tx
                    .query_row(
                        schema::SELECT_DOCUMENT_VERSION,
                        [&container, &partition_key, &row_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()
                    .map_err(wrap_err)?;

                let outcome = match current {
                    None => ReplaceOutcome::Missing,
                    Some((_, stored_etag))
                        if expected_etag.as_ref().is_some_and(|e| *e != stored_etag) =>
                    {
                        ReplaceOutcome::Stale
                    }
                    Some((resource_id, _)) => {
                        item[metadata::RESOURCE_ID_FIELD] = Value::String(resource_id);
                        let body = serde_json::to_string(&item)
                            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
                        tx.execute(
                            schema::UPDATE_DOCUMENT,
                            rusqlite::params![container, partition_key, row_id, etag, body],
                        )
                        .map_err(wrap_err)?;
                        ReplaceOutcome::Replaced(item)
                    }
                };

                tx.commit().map_err(wrap_err)?;
                Ok(outcome)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_key(e, &id, partition))?;

        match outcome {
            ReplaceOutcome::Replaced(item) => Ok(item),
            ReplaceOutcome::Missing => Err(StoreError::not_found(id, partition)),
            ReplaceOutcome::Stale => Err(StoreError::precondition_failed(
                id,
                if_match.unwrap_or_default(),
            )),
        }
    }

    async fn delete_item(&self, id: &str, partition: &str) -> Result<()> {
        let container = self.container.clone();
        let partition_key = partition.to_string();
        let row_id = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::DELETE_DOCUMENT,
                        [&container, &partition_key, &row_id],
                    )
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_key(e, id, partition))
    }

    async fn query_items(
        &self,
        partition: &str,
        query: &Query,
        page: PageRequest,
    ) -> Result<QueryPage> {
        let after: i64 = match &page.continuation {
            Some(token) => token.decode()?,
            None => 0,
        };
        let predicate = if query.is_match_all() {
            equality_predicate(query)?
        } else {
            schema::check_predicate(query.text()).map_err(StoreError::InvalidQuery)?;
            Some(query.text().to_string())
        };
        let sql = schema::select_page(predicate.as_deref());
        let caller_params = query_parameters(query)?;

        let container = self.container.clone();
        let partition_key = partition.to_string();
        let max_item_count = page.max_item_count;
        // One extra row tells us whether another page exists.
        let limit = i64::try_from(max_item_count)
            .map_err(|_| StoreError::InvalidQuery("Page size too large".to_string()))?
            + 1;

        let rows: Vec<(i64, String)> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;

                let mut params: Vec<(&str, &dyn ToSql)> = vec![
                    (schema::CONTAINER_PARAM, &container as &dyn ToSql),
                    (schema::PARTITION_PARAM, &partition_key as &dyn ToSql),
                    (schema::AFTER_PARAM, &after as &dyn ToSql),
                    (schema::LIMIT_PARAM, &limit as &dyn ToSql),
                ];
                for (name, value) in &caller_params {
                    params.push((name.as_str(), value as &dyn ToSql));
                }

                let mapped = stmt
                    .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))
                    .map_err(wrap_err)?;

                let mut rows = Vec::new();
                for row_result in mapped {
                    rows.push(row_result.map_err(wrap_err)?);
                }
                Ok(rows)
            })
            .await
            .map_err(map_query_error)?;

        let has_more = rows.len() > max_item_count;
        let rows = &rows[..rows.len().min(max_item_count)];

        let continuation = match rows.last() {
            Some((seq, _)) if has_more => Some(ContinuationToken::encode(seq)?),
            _ => None,
        };

        let items = rows
            .iter()
            .map(|(_, body)| parse_body(body))
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryPage::new(items, continuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    async fn store() -> SqliteStore {
        SqliteStore::open_in_memory(ResourcePath::new("samples", "documents"))
            .await
            .unwrap()
    }

    fn document(partition: &str, text: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "type": partition,
            "stringProperty": text,
            "embeddedProperty": { "stringProperty": format!("{text}-embedded") },
        })
    }

    fn id_of(item: &Value) -> String {
        item["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = store().await;
        let item = document("TestDocument", "a");
        let id = id_of(&item);

        let created = store.create_item("TestDocument", item).await.unwrap();
        let read = store.read_item(&id, "TestDocument").await.unwrap();

        assert_eq!(read, Some(created.clone()));
        assert!(created["_etag"].is_string());
        assert_eq!(created["embeddedProperty"]["stringProperty"], json!("a-embedded"));
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let store = store().await;
        let item = document("TestDocument", "a");

        store.create_item("TestDocument", item.clone()).await.unwrap();
        let result = store.create_item("TestDocument", item).await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let store = store().await;
        let result = store.read_item("missing", "TestDocument").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_replace_keeps_resource_id() {
        let store = store().await;
        let created = store
            .create_item("TestDocument", document("TestDocument", "a"))
            .await
            .unwrap();
        let etag = created["_etag"].as_str().unwrap().to_string();

        let mut changed = created.clone();
        changed["stringProperty"] = json!("b");
        let replaced = store
            .replace_item("TestDocument", changed, Some(&etag))
            .await
            .unwrap();

        assert_eq!(replaced["stringProperty"], json!("b"));
        assert_eq!(replaced["_rid"], created["_rid"]);
        assert_ne!(replaced["_etag"], created["_etag"]);

        let read = store
            .read_item(&id_of(&created), "TestDocument")
            .await
            .unwrap();
        assert_eq!(read, Some(replaced));
    }

    #[tokio::test]
    async fn test_replace_with_stale_etag() {
        let store = store().await;
        let created = store
            .create_item("TestDocument", document("TestDocument", "a"))
            .await
            .unwrap();
        let etag = created["_etag"].as_str().unwrap().to_string();

        store
            .replace_item("TestDocument", created.clone(), Some(&etag))
            .await
            .unwrap();
        let result = store
            .replace_item("TestDocument", created, Some(&etag))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::PreconditionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_nonexistent() {
        let store = store().await;
        let result = store
            .replace_item("TestDocument", document("TestDocument", "a"), None)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store().await;
        let created = store
            .create_item("TestDocument", document("TestDocument", "a"))
            .await
            .unwrap();
        let id = id_of(&created);

        store.delete_item(&id, "TestDocument").await.unwrap();

        assert!(store.read_item(&id, "TestDocument").await.unwrap().is_none());
        let result = store.delete_item(&id, "TestDocument").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_query_pages() {
        let store = store().await;
        let mut ids = Vec::new();
        for i in 0..5 {
            let created = store
                .create_item("TestDocument", document("TestDocument", &i.to_string()))
                .await
                .unwrap();
            ids.push(id_of(&created));
        }

        let mut seen = Vec::new();
        let mut request = PageRequest::first(2);
        loop {
            let page = store
                .query_items("TestDocument", &Query::all(), request.clone())
                .await
                .unwrap();
            assert!(page.items.len() <= 2);
            seen.extend(page.items.iter().map(id_of));
            match page.continuation {
                Some(token) => request = PageRequest::after(2, token),
                None => break,
            }
        }

        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn test_query_with_predicate() {
        let store = store().await;
        for text in ["a", "b", "a"] {
            store
                .create_item("TestDocument", document("TestDocument", text))
                .await
                .unwrap();
        }

        let query = Query::new("json_extract(body, '$.stringProperty') = @value")
            .with_parameter("@value", "a");
        let page = store
            .query_items("TestDocument", &query, PageRequest::first(10))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_query_invalid_predicate() {
        let store = store().await;
        let result = store
            .query_items(
                "TestDocument",
                &Query::new("this is not sql"),
                PageRequest::first(10),
            )
            .await;

        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let conn_path = ResourcePath::new("samples", "documents");
        let store = SqliteStore::open_in_memory(conn_path).await.unwrap();
        store
            .create_item("TestDocument", document("TestDocument", "a"))
            .await
            .unwrap();

        let page = store
            .query_items("OtherDocument", &Query::all(), PageRequest::first(10))
            .await
            .unwrap();

        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_match_all_parameters_filter_by_field() {
        let store = store().await;
        for text in ["a", "b", "a"] {
            store
                .create_item("TestDocument", document("TestDocument", text))
                .await
                .unwrap();
        }

        let query = Query::all().with_parameter("@stringProperty", "a");
        let page = store
            .query_items("TestDocument", &query, PageRequest::first(10))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|item| item["stringProperty"] == json!("a")));
    }

    #[tokio::test]
    async fn test_predicate_cannot_leave_partition_scope() {
        let db_path = std::env::temp_dir().join(format!("docpersist-{}.db", Uuid::new_v4()));
        let db_path = db_path.to_string_lossy().to_string();
        let documents = SqliteStore::open(&db_path, ResourcePath::new("samples", "documents"))
            .await
            .unwrap();
        let secret = SqliteStore::open(&db_path, ResourcePath::new("samples", "secret"))
            .await
            .unwrap();
        documents
            .create_item("TestDocument", document("TestDocument", "a"))
            .await
            .unwrap();
        secret
            .create_item("Hidden", document("Hidden", "s"))
            .await
            .unwrap();

        let escaped = documents
            .query_items("Empty", &Query::new("1) OR (1"), PageRequest::first(10))
            .await;
        let always_true = documents
            .query_items("Empty", &Query::new("1 OR 1 = 1"), PageRequest::first(10))
            .await;
        drop(documents);
        drop(secret);
        let _ = std::fs::remove_file(&db_path);

        assert!(matches!(escaped, Err(StoreError::InvalidQuery(_))));
        assert!(always_true.unwrap().items.is_empty());
    }
}
