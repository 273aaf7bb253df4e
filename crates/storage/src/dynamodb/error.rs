//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `docpersist_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use docpersist_core::storage::StoreError;

const VALIDATION_EXCEPTION: &str = "ValidationException";

/// Map failures that never reached the service.
fn map_transport_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError> {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            StoreError::ConnectionFailed("Could not reach DynamoDB".to_string()),
        ),
        SdkError::ConstructionFailure(_) => Some(StoreError::QueryFailed(
            "Could not build DynamoDB request".to_string(),
        )),
        _ => None,
    }
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error raised while creating a document.
pub fn map_create_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    id: &str,
    partition: &str,
) -> StoreError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::conflict(id, partition),
        err => map_put_item_error(err),
    }
}

/// Map a PutItem SDK error raised while replacing a document.
///
/// A failed condition with no previous item means the document is gone;
/// otherwise its etag no longer matches.
pub fn map_replace_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    id: &str,
    partition: &str,
    if_match: Option<&str>,
) -> StoreError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(failed) => match failed.item() {
            Some(_) => StoreError::precondition_failed(id, if_match.unwrap_or_default()),
            None => StoreError::not_found(id, partition),
        },
        err => map_put_item_error(err),
    }
}

fn map_put_item_error(err: PutItemError) -> StoreError {
    match err {
        PutItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled("Throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled("Request limit exceeded, please retry".to_string())
        }
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::QueryFailed("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::Throttled("Transaction conflict, please retry".to_string())
        }
        PutItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    id: &str,
    partition: &str,
) -> StoreError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => {
            StoreError::not_found(id, partition)
        }
        DeleteItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled("Throughput exceeded, please retry".to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled("Request limit exceeded, please retry".to_string())
        }
        DeleteItemError::TransactionConflictException(_) => {
            StoreError::Throttled("Transaction conflict, please retry".to_string())
        }
        DeleteItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
///
/// DynamoDB rejects malformed filter expressions with a `ValidationException`.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled("Throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::Throttled("Request limit exceeded, please retry".to_string())
        }
        QueryError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err if err.code() == Some(VALIDATION_EXCEPTION) => StoreError::InvalidQuery(
            err.message()
                .unwrap_or("Invalid query expression")
                .to_string(),
        ),
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a generic connection/config error to StoreError.
pub fn map_connection_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::ConnectionFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::ConditionalCheckFailedException;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn condition_failed(
        previous: Option<AttributeValue>,
    ) -> SdkError<PutItemError, ()> {
        let mut failed = ConditionalCheckFailedException::builder();
        if let Some(value) = previous {
            failed = failed.item("PK", value);
        }
        SdkError::service_error(
            PutItemError::ConditionalCheckFailedException(failed.build()),
            (),
        )
    }

    #[test]
    fn test_create_condition_failure_maps_to_conflict() {
        let result = map_create_error(condition_failed(None), "abc-123", "TestDocument");
        assert_eq!(result, StoreError::conflict("abc-123", "TestDocument"));
    }

    #[test]
    fn test_replace_condition_failure_without_item_maps_to_not_found() {
        let result = map_replace_error(
            condition_failed(None),
            "abc-123",
            "TestDocument",
            Some("\"etag\""),
        );
        assert_eq!(result, StoreError::not_found("abc-123", "TestDocument"));
    }

    #[test]
    fn test_replace_condition_failure_with_item_maps_to_precondition_failed() {
        let previous = AttributeValue::S("TestDocument".to_string());

        let result = map_replace_error(
            condition_failed(Some(previous)),
            "abc-123",
            "TestDocument",
            Some("\"etag\""),
        );

        assert_eq!(
            result,
            StoreError::precondition_failed("abc-123", "\"etag\"")
        );
    }

    #[test]
    fn test_delete_condition_failure_maps_to_not_found() {
        let err = SdkError::service_error(
            DeleteItemError::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder().build(),
            ),
            (),
        );

        let result = map_delete_item_error(err, "abc-123", "TestDocument");

        assert_eq!(result, StoreError::not_found("abc-123", "TestDocument"));
    }
}
