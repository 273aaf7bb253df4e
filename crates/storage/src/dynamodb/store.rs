//! DynamoDB document store implementation.
//!
//! Implements `DocumentStore` from `docpersist_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use serde_json::Value;

use docpersist_core::options::DocumentClientOptions;
use docpersist_core::storage::metadata::{self, document_id_in};
use docpersist_core::storage::{
    DocumentStore, PageRequest, Query, QueryPage, ResourcePath, Result, StoreError,
};

use super::conversions::{document_to_item, item_to_document, query_filter};
use super::error::{
    map_connection_error, map_create_error, map_delete_item_error, map_get_item_error,
    map_query_error, map_replace_error,
};
use super::keys;

const DEFAULT_REGION: &str = "us-east-1";

/// DynamoDB-based document store.
///
/// Provides async access to one `{database}.{container}` table.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
    path: ResourcePath,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client, path: ResourcePath) -> Self {
        Self {
            client,
            table_name: keys::table_name(&path),
            path,
        }
    }

    /// Creates a store from client options.
    ///
    /// `account_endpoint` overrides the service endpoint (local DynamoDB) and
    /// `account_key` supplies static `ACCESS_KEY_ID:SECRET` credentials. Empty
    /// values fall back to the AWS SDK defaults. The region comes from
    /// `AWS_REGION` (defaults to us-east-1).
    pub async fn connect(options: &DocumentClientOptions) -> Result<Self> {
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));

        if !options.account_endpoint.is_empty() {
            loader = loader.endpoint_url(&options.account_endpoint);
        }

        if !options.account_key.is_empty() {
            let (access_key_id, secret) = options.account_key.split_once(':').ok_or_else(|| {
                map_connection_error("Account key must have the form ACCESS_KEY_ID:SECRET")
            })?;
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret,
                None,
                None,
                "docpersist",
            ));
        }

        let sdk_config = loader.load().await;
        Ok(Self::new(Client::new(&sdk_config), options.resource_path()))
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get(&self, id: &str, partition: &str) -> Result<Option<Value>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(keys::primary_key(partition, id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(item_to_document).transpose()
    }
}

#[async_trait]
impl DocumentStore for DynamoDbStore {
    fn describe(&self) -> &'static str {
        "dynamodb"
    }

    async fn create_item(&self, partition: &str, mut item: Value) -> Result<Value> {
        let id = document_id_in(&item, partition)?;
        let resource_id = metadata::new_resource_id();
        metadata::stamp(&mut item, &self.path, &resource_id, Utc::now())?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(document_to_item(&item, partition, &id)?))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| map_create_error(e, &id, partition))?;

        Ok(item)
    }

    async fn read_item(&self, id: &str, partition: &str) -> Result<Option<Value>> {
        self.get(id, partition).await
    }

    async fn replace_item(
        &self,
        partition: &str,
        mut item: Value,
        if_match: Option<&str>,
    ) -> Result<Value> {
        let id = document_id_in(&item, partition)?;

        // The resource id is immutable, so it is carried over from the stored copy.
        let current = self
            .get(&id, partition)
            .await?
            .ok_or_else(|| StoreError::not_found(&id, partition))?;
        let resource_id = metadata::resource_id_of(&current)
            .unwrap_or_default()
            .to_string();
        metadata::stamp(&mut item, &self.path, &resource_id, Utc::now())?;

        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(document_to_item(&item, partition, &id)?))
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld);

        request = match if_match {
            Some(etag) => request
                .condition_expression("attribute_exists(PK) AND #etag = :etag")
                .expression_attribute_names("#etag", metadata::ETAG_FIELD)
                .expression_attribute_values(":etag", AttributeValue::S(etag.to_string())),
            None => request.condition_expression("attribute_exists(PK)"),
        };

        request
            .send()
            .await
            .map_err(|e| map_replace_error(e, &id, partition, if_match))?;

        Ok(item)
    }

    async fn delete_item(&self, id: &str, partition: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(keys::primary_key(partition, id)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, id, partition))?;

        Ok(())
    }

    async fn query_items(
        &self,
        partition: &str,
        query: &Query,
        page: PageRequest,
    ) -> Result<QueryPage> {
        let limit = i32::try_from(page.max_item_count)
            .map_err(|_| StoreError::InvalidQuery("Page size too large".to_string()))?;
        let start_key = page
            .continuation
            .as_ref()
            .map(keys::decode_start_key)
            .transpose()?;

        let filter = query_filter(query)?.unwrap_or_default();
        let mut names = filter.names;
        names.insert("#__pk".to_string(), keys::PARTITION_KEY.to_string());
        let mut values = filter.values;
        values.insert(
            ":__pk".to_string(),
            AttributeValue::S(partition.to_string()),
        );

        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#__pk = :__pk")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .set_exclusive_start_key(start_key)
            .limit(limit)
            .consistent_read(true);

        if !filter.expression.is_empty() {
            request = request.filter_expression(filter.expression);
        }

        let result = request.send().await.map_err(map_query_error)?;

        // `Limit` applies before the filter, so a page can be empty and still
        // carry a continuation.
        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_document)
            .collect::<Result<Vec<_>>>()?;
        let continuation = result
            .last_evaluated_key
            .as_ref()
            .map(keys::encode_start_key)
            .transpose()?;

        Ok(QueryPage::new(items, continuation))
    }
}
