use aws_sdk_dynamodb::types::{AttributeValue, WriteRequest};
use dynamo_bulk::requests::put_request;
use dynamo_bulk::{Item, Key};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Partition key attribute used by every fixture
pub const PK: &str = "pk";

/// Simple record stored by the mock backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub pk: String,
    pub name: String,
    pub count: u32,
}

impl TestRecord {
    pub fn new(id: usize) -> Self {
        Self {
            pk: id_for(id),
            name: format!("record {id}"),
            count: id as u32,
        }
    }
}

/// Partition key value for fixture number `id`
pub fn id_for(id: usize) -> String {
    format!("id-{id:04}")
}

pub fn key(id: usize) -> Key {
    HashMap::from([(PK.to_string(), AttributeValue::S(id_for(id)))])
}

pub fn keys(range: std::ops::Range<usize>) -> Vec<Key> {
    range.map(key).collect()
}

pub fn item(id: usize) -> Item {
    serde_dynamo::to_item(TestRecord::new(id)).unwrap()
}

pub fn records(range: std::ops::Range<usize>) -> Vec<TestRecord> {
    range.map(TestRecord::new).collect()
}

pub fn put_requests(range: std::ops::Range<usize>) -> Vec<WriteRequest> {
    range.map(|id| put_request(&TestRecord::new(id)).unwrap()).collect()
}

/// Partition key string of a key or item
pub fn pk_of(attributes: &HashMap<String, AttributeValue>) -> String {
    match attributes.get(PK) {
        Some(AttributeValue::S(value)) => value.clone(),
        other => panic!("missing string partition key: {other:?}"),
    }
}

/// Partition key string of a put or delete request
pub fn request_pk(request: &WriteRequest) -> String {
    if let Some(put) = request.put_request() {
        return pk_of(&put.item);
    }
    if let Some(delete) = request.delete_request() {
        return pk_of(&delete.key);
    }
    panic!("empty write request")
}
