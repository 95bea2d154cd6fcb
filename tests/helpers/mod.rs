//! Test helpers and fixtures for bulk executor integration tests
//!
//! This module provides an in-memory storage backend with content-based fault
//! injection, plus fixtures shared by all integration tests.
#![allow(dead_code)]

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use aws_sdk_dynamodb::types::{TransactWriteItem, WriteRequest};
use dynamo_bulk::{BatchGetOutput, BulkExecutor, Error, Item, Key, StorageBackend};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Table name every test executor targets
pub const TABLE: &str = "entities";

/// In-memory key-value store keyed by partition key
///
/// Faults are keyed by content rather than call order, because chunk execution order
/// is unspecified:
/// - a call touching a `fail_on` id fails as a whole with a transport error
/// - an input with an `unprocessed_on` id is reported back as unprocessed
/// - a call touching a `stall_on` id waits for cancellation
#[derive(Debug, Default)]
pub struct MockBackend {
    store: Mutex<HashMap<String, Item>>,
    fail_on: HashSet<String>,
    unprocessed_on: HashSet<String>,
    stall_on: HashSet<String>,
    latency: Duration,
    calls: AtomicUsize,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with fixture records `range`
    pub fn with_records(range: std::ops::Range<usize>) -> Self {
        let backend = Self::default();
        {
            let mut store = backend.store.lock().unwrap();
            for id in range {
                let _ = store.insert(id_for(id), item(id));
            }
        }
        backend
    }

    /// Store `item` under fixture id `id` as is, bypassing serialization
    pub fn insert_raw(self, id: usize, item: Item) -> Self {
        let _ = self.store.lock().unwrap().insert(id_for(id), item);
        self
    }

    pub fn fail_on(mut self, id: usize) -> Self {
        let _ = self.fail_on.insert(id_for(id));
        self
    }

    pub fn unprocessed_on(mut self, id: usize) -> Self {
        let _ = self.unprocessed_on.insert(id_for(id));
        self
    }

    pub fn stall_on(mut self, id: usize) -> Self {
        let _ = self.stall_on.insert(id_for(id));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn stored(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.store.lock().unwrap().contains_key(&id_for(id))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sizes of every chunk received, largest first
    pub fn chunk_sizes(&self) -> Vec<usize> {
        let mut sizes = self.chunk_sizes.lock().unwrap().clone();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    fn record_call(&self, size: usize) {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        self.chunk_sizes.lock().unwrap().push(size);
    }

    async fn gate(&self, cancel: &CancellationToken, pks: &[String]) -> Result<(), Error> {
        if pks.iter().any(|pk| self.stall_on.contains(pk)) {
            cancel.cancelled().await;
            return Err(Error::Cancelled);
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        if let Some(pk) = pks.iter().find(|pk| self.fail_on.contains(*pk)) {
            return Err(Error::backend(format!("connection reset while writing {pk}")));
        }
        Ok(())
    }
}

impl StorageBackend for MockBackend {
    async fn batch_get(
        &self,
        cancel: &CancellationToken,
        table: &str,
        keys: Vec<Key>,
    ) -> Result<BatchGetOutput, Error> {
        assert_eq!(table, TABLE);
        self.record_call(keys.len());

        let pks: Vec<String> = keys.iter().map(pk_of).collect();
        self.gate(cancel, &pks).await?;

        let store = self.store.lock().unwrap();
        let mut output = BatchGetOutput::default();
        for (key, pk) in keys.into_iter().zip(&pks) {
            if self.unprocessed_on.contains(pk) {
                output.unprocessed_keys.push(key);
            } else if let Some(item) = store.get(pk) {
                output.items.push(item.clone());
            }
        }
        Ok(output)
    }

    async fn batch_write(
        &self,
        cancel: &CancellationToken,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error> {
        assert_eq!(table, TABLE);
        self.record_call(requests.len());

        let pks: Vec<String> = requests.iter().map(request_pk).collect();
        self.gate(cancel, &pks).await?;

        let mut store = self.store.lock().unwrap();
        let mut unprocessed = Vec::new();
        for (request, pk) in requests.into_iter().zip(pks) {
            if self.unprocessed_on.contains(&pk) {
                unprocessed.push(request);
            } else if let Some(put) = request.put_request() {
                let _ = store.insert(pk, put.item.clone());
            } else {
                let _ = store.remove(&pk);
            }
        }
        Ok(unprocessed)
    }

    async fn transact_write(
        &self,
        cancel: &CancellationToken,
        items: Vec<TransactWriteItem>,
    ) -> Result<(), Error> {
        self.record_call(items.len());

        let puts: Vec<Item> = items
            .iter()
            .map(|item| {
                let put = item.put().expect("fixture transact items are puts");
                assert_eq!(put.table_name, TABLE);
                put.item.clone()
            })
            .collect();
        let pks: Vec<String> = puts.iter().map(pk_of).collect();
        self.gate(cancel, &pks).await?;

        let mut store = self.store.lock().unwrap();
        for (pk, item) in pks.into_iter().zip(puts) {
            let _ = store.insert(pk, item);
        }
        Ok(())
    }
}

/// Executor over `backend` targeting [`TABLE`]
pub fn executor(backend: &Arc<MockBackend>) -> BulkExecutor<MockBackend> {
    BulkExecutor::builder()
        .backend(Arc::clone(backend))
        .table_name(TABLE)
        .build()
        .unwrap()
}

/// Install a test subscriber so `RUST_LOG=debug cargo test` shows chunk logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
