//! Builders for the write requests and filter expressions fed to the bulk executor

use aws_sdk_dynamodb::types::{
    AttributeValue, DeleteRequest, Put, PutRequest, TransactWriteItem, WriteRequest,
};
use serde::Serialize;
use serde_dynamo::to_item;
use std::collections::HashMap;

use crate::bulk::{Item, Key};
use crate::error::Error;
use crate::reserved::is_reserved_word;

/// Serialize `record` into a best-effort put request
pub fn put_request<T: Serialize>(record: &T) -> Result<WriteRequest, Error> {
    let item: Item = to_item(record)?;
    let put_request = PutRequest::builder().set_item(Some(item)).build()?;

    Ok(WriteRequest::builder()
        .set_put_request(Some(put_request))
        .build())
}

/// Serialize every record into a put request, preserving order
pub fn put_requests<T: Serialize>(records: &[T]) -> Result<Vec<WriteRequest>, Error> {
    records.iter().map(put_request).collect()
}

/// Best-effort delete request for `key`
pub fn delete_request(key: Key) -> Result<WriteRequest, Error> {
    let delete_request = DeleteRequest::builder().set_key(Some(key)).build()?;

    Ok(WriteRequest::builder()
        .set_delete_request(Some(delete_request))
        .build())
}

/// Serialize `record` into a transactional put against `table_name`
pub fn put_transact_item<T: Serialize>(
    table_name: &str,
    record: &T,
) -> Result<TransactWriteItem, Error> {
    let item: Item = to_item(record)?;
    let put = Put::builder()
        .table_name(table_name)
        .set_item(Some(item))
        .build()?;

    Ok(TransactWriteItem::builder().put(put).build())
}

/// A filter-expression `IN` clause and its placeholder values
#[derive(Clone, Debug, PartialEq)]
pub struct InExpression {
    /// e.g. `ResourceType IN (:resType1,:resType2)`
    pub expression: String,
    /// Placeholder to value map, for `expression_attribute_values`
    pub values: HashMap<String, AttributeValue>,
}

/// Build `key_name IN (:prefix1,:prefix2,...)` with one string placeholder per value
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty key name, prefix or value list, and for
/// a key name that is a DynamoDB reserved word. The key name is written into the
/// expression as is; no `#name` alias is emitted, so a reserved name such as `status`
/// would be rejected by DynamoDB at query time and is refused here instead.
pub fn in_expression<S: AsRef<str>>(
    key_name: &str,
    prefix: &str,
    values: &[S],
) -> Result<InExpression, Error> {
    if key_name.is_empty() {
        return Err(Error::InvalidInput("IN expression key name is empty".to_string()));
    }
    if prefix.is_empty() {
        return Err(Error::InvalidInput("IN expression placeholder prefix is empty".to_string()));
    }
    if values.is_empty() {
        return Err(Error::InvalidInput("IN expression has no values".to_string()));
    }
    if is_reserved_word(key_name) {
        return Err(Error::InvalidInput(format!("reserved key: {key_name}")));
    }

    let mut placeholders = Vec::with_capacity(values.len());
    let mut attribute_values = HashMap::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        let placeholder = format!(":{prefix}{}", i + 1);
        let _ = attribute_values.insert(
            placeholder.clone(),
            AttributeValue::S(value.as_ref().to_string()),
        );
        placeholders.push(placeholder);
    }

    Ok(InExpression {
        expression: format!("{key_name} IN ({})", placeholders.join(",")),
        values: attribute_values,
    })
}
