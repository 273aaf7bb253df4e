//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between JSON documents and DynamoDB
//! AttributeValue maps. These are testable in isolation without DynamoDB
//! access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use docpersist_core::storage::{bare_parameter_name, Query, StoreError};

use super::keys::{self, PARTITION_KEY, SORT_KEY};

/// Convert a JSON value to an AttributeValue.
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), json_to_attribute(value)))
                .collect(),
        ),
    }
}

/// Convert an AttributeValue to a JSON value.
///
/// String and number sets become arrays. Binary attributes have no JSON form.
pub fn attribute_to_json(value: &AttributeValue) -> Result<Value, StoreError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::N(n) => parse_number(n).map(Value::Number),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::L(values) => values
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(fields) => fields_to_object(fields.iter()),
        AttributeValue::Ss(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|n| parse_number(n).map(Value::Number))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(StoreError::InvalidData(format!(
            "Unsupported attribute type: {other:?}"
        ))),
    }
}

/// Convert a document to a DynamoDB item keyed by partition and id.
///
/// Top-level `PK`/`SK` fields are owned by the table key and are overwritten.
pub fn document_to_item(
    document: &Value,
    partition: &str,
    id: &str,
) -> Result<HashMap<String, AttributeValue>, StoreError> {
    let Value::Object(fields) = document else {
        return Err(StoreError::InvalidData(
            "Document must be a JSON object".to_string(),
        ));
    };

    let mut item: HashMap<String, AttributeValue> = fields
        .iter()
        .map(|(name, value)| (name.clone(), json_to_attribute(value)))
        .collect();
    item.extend(keys::primary_key(partition, id));

    Ok(item)
}

/// Convert a DynamoDB item back to a document, dropping the key attributes.
pub fn item_to_document(item: &HashMap<String, AttributeValue>) -> Result<Value, StoreError> {
    fields_to_object(
        item.iter()
            .filter(|(name, _)| name.as_str() != PARTITION_KEY && name.as_str() != SORT_KEY),
    )
}

/// Convert query parameters into DynamoDB expression attribute values.
///
/// DynamoDB placeholders always start with `:`, so `@name` binds as `:name`.
pub fn expression_values(query: &Query) -> Result<HashMap<String, AttributeValue>, StoreError> {
    query
        .parameters()
        .iter()
        .map(|(name, value)| {
            let bare = bare_parameter_name(name);
            if bare.is_empty() || bare.starts_with("__") {
                return Err(StoreError::InvalidQuery(format!(
                    "Invalid parameter name: {name}"
                )));
            }
            Ok((format!(":{bare}"), json_to_attribute(value)))
        })
        .collect()
}

/// Filter expression sent alongside the partition key condition.
#[derive(Debug, Default, PartialEq)]
pub struct QueryFilter {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Build the filter for a query, or `None` when every item matches.
///
/// A match-all query with parameters filters by equality on the top-level
/// attribute of each parameter's bare name. Any other text is used as the
/// filter expression with the parameters as its values.
pub fn query_filter(query: &Query) -> Result<Option<QueryFilter>, StoreError> {
    let values = expression_values(query)?;

    if !query.is_match_all() {
        return Ok(Some(QueryFilter {
            expression: query.text().to_string(),
            names: HashMap::new(),
            values,
        }));
    }
    if values.is_empty() {
        return Ok(None);
    }

    let mut filter = QueryFilter {
        values,
        ..Default::default()
    };
    let mut clauses = Vec::new();
    for (index, name) in query.parameters().keys().enumerate() {
        let placeholder = format!("#f{index}");
        let bare = bare_parameter_name(name);
        clauses.push(format!("{placeholder} = :{bare}"));
        filter.names.insert(placeholder, bare.to_string());
    }
    filter.expression = clauses.join(" AND ");

    Ok(Some(filter))
}

fn fields_to_object<'a>(
    fields: impl Iterator<Item = (&'a String, &'a AttributeValue)>,
) -> Result<Value, StoreError> {
    let mut object = Map::new();
    for (name, value) in fields {
        object.insert(name.clone(), attribute_to_json(value)?);
    }
    Ok(Value::Object(object))
}

fn parse_number(n: &str) -> Result<Number, StoreError> {
    n.parse::<Number>()
        .map_err(|e| StoreError::InvalidData(format!("Invalid number attribute {n}: {e}")))
}
