use aws_sdk_dynamodb::types::{TransactWriteItem, WriteRequest};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::backend::StorageBackend;
use crate::bulk::{
    BulkReadOutput, BulkWriteOutput, ChunkResponse, Key, dispatch, merge_best_effort,
    merge_transactional, plan_chunks,
};
use crate::error::Error;

/// Maximum keys per bulk-get call
pub const BATCH_READ_SIZE: usize = 100;
/// Maximum requests per best-effort bulk-write call
pub const BATCH_WRITE_SIZE: usize = 25;
/// Maximum items per transactional write call
pub const TRANSACT_WRITE_SIZE: usize = 100;

/// Executes unbounded bulk reads and writes against one table
///
/// Every call plans its input into backend-sized chunks, runs one backend call per
/// chunk concurrently and merges the outcomes. The backend handle is shared, never
/// locked, and may serve any number of simultaneous calls.
#[derive(Debug)]
pub struct BulkExecutor<B> {
    backend: Arc<B>,
    table_name: String,
}

impl<B> Clone for BulkExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            table_name: self.table_name.clone(),
        }
    }
}

impl<B> BulkExecutor<B>
where
    B: StorageBackend,
{
    /// Start building an executor
    pub fn builder() -> BulkExecutorBuilder<B> {
        BulkExecutorBuilder::default()
    }

    /// Table all calls are issued against
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Shared backend handle
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn validate(&self) -> Result<(), Error> {
        if self.table_name.trim().is_empty() {
            return Err(Error::InvalidInput("table name is empty".to_string()));
        }
        Ok(())
    }

    /// Read every key, at most [`BATCH_READ_SIZE`] keys per backend call
    ///
    /// Keys of a failed chunk land in `unprocessed_keys` and the failure is described in
    /// `error`. The call itself only fails if no chunk completed; the resulting
    /// [`Error::Dispatch`] then holds every key, see [`Error::into_unprocessed_keys`].
    /// An empty key list is a successful no-op.
    #[tracing::instrument(skip(self, cancel, keys), fields(table = %self.table_name, keys = keys.len()))]
    pub async fn bulk_read(
        &self,
        cancel: &CancellationToken,
        keys: Vec<Key>,
    ) -> Result<BulkReadOutput, Error> {
        self.validate()?;
        let start_time = Instant::now();

        let chunks = plan_chunks(keys, BATCH_READ_SIZE)?;
        if chunks.is_empty() {
            return Ok(BulkReadOutput::default());
        }

        let backend = &self.backend;
        let table = self.table_name.as_str();

        let outcomes = dispatch(cancel, &chunks, |cancel, keys| async move {
            let output = backend.batch_get(&cancel, table, keys).await?;
            Ok::<_, Error>(ChunkResponse {
                items: output.items,
                unprocessed: output.unprocessed_keys,
            })
        })
        .await;

        let merge = merge_best_effort(chunks, outcomes).into_result()?;

        Ok(BulkReadOutput {
            items: merge.items,
            unprocessed_keys: merge.unprocessed,
            error: merge.failures,
            chunk_count: merge.chunk_count,
            total_duration: start_time.elapsed(),
        })
    }

    /// Apply put/delete requests, at most [`BATCH_WRITE_SIZE`] per backend call
    ///
    /// Each request may independently succeed or fail. Callers must check
    /// `unprocessed` even when the call returns `Ok`; retrying those is up to them.
    /// When no chunk completes the call fails with [`Error::Dispatch`], which hands
    /// every request back through [`Error::into_unprocessed_requests`].
    #[tracing::instrument(skip(self, cancel, requests), fields(table = %self.table_name, requests = requests.len()))]
    pub async fn bulk_write_best_effort(
        &self,
        cancel: &CancellationToken,
        requests: Vec<WriteRequest>,
    ) -> Result<BulkWriteOutput, Error> {
        self.validate()?;
        let start_time = Instant::now();

        let chunks = plan_chunks(requests, BATCH_WRITE_SIZE)?;
        if chunks.is_empty() {
            return Ok(BulkWriteOutput::default());
        }

        let backend = &self.backend;
        let table = self.table_name.as_str();

        let outcomes = dispatch(cancel, &chunks, |cancel, requests| async move {
            let unprocessed = backend.batch_write(&cancel, table, requests.clone()).await?;
            Ok::<_, Error>(ChunkResponse {
                items: applied(requests, &unprocessed),
                unprocessed,
            })
        })
        .await;

        let merge = merge_best_effort(chunks, outcomes).into_result()?;

        Ok(BulkWriteOutput {
            written: merge.items,
            unprocessed: merge.unprocessed,
            error: merge.failures,
            chunk_count: merge.chunk_count,
            total_duration: start_time.elapsed(),
        })
    }

    /// Apply transactional items, at most [`TRANSACT_WRITE_SIZE`] per atomic backend call
    ///
    /// Fails with [`Error::Chunk`] if any chunk fails. Chunks that already committed stay
    /// committed: atomicity holds within a chunk, never across chunks.
    #[tracing::instrument(skip(self, cancel, items), fields(table = %self.table_name, items = items.len()))]
    pub async fn bulk_write_transactional(
        &self,
        cancel: &CancellationToken,
        items: Vec<TransactWriteItem>,
    ) -> Result<(), Error> {
        self.validate()?;

        let chunks = plan_chunks(items, TRANSACT_WRITE_SIZE)?;
        if chunks.is_empty() {
            return Ok(());
        }

        let backend = &self.backend;

        let outcomes = dispatch(cancel, &chunks, |cancel, items| async move {
            backend.transact_write(&cancel, items).await?;
            Ok::<_, Error>(ChunkResponse::<(), TransactWriteItem>::empty())
        })
        .await;

        merge_transactional(outcomes)
    }
}

/// Requests of a chunk minus the ones reported back as unprocessed
fn applied(requests: Vec<WriteRequest>, unprocessed: &[WriteRequest]) -> Vec<WriteRequest> {
    let mut pending: Vec<&WriteRequest> = unprocessed.iter().collect();
    requests
        .into_iter()
        .filter(|request| match pending.iter().position(|p| *p == request) {
            Some(found) => {
                let _ = pending.swap_remove(found);
                false
            }
            None => true,
        })
        .collect()
}

/// Builder for [`BulkExecutor`]
#[derive(Debug)]
pub struct BulkExecutorBuilder<B> {
    backend: Option<Arc<B>>,
    table_name: Option<String>,
}

impl<B> Default for BulkExecutorBuilder<B> {
    fn default() -> Self {
        Self {
            backend: None,
            table_name: None,
        }
    }
}

impl<B> BulkExecutorBuilder<B>
where
    B: StorageBackend,
{
    /// Backend handle to issue calls on
    pub fn backend(mut self, backend: Arc<B>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Table to read from and write to
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Build the executor
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the backend or table name is missing.
    pub fn build(self) -> Result<BulkExecutor<B>, Error> {
        let backend = self
            .backend
            .ok_or_else(|| Error::InvalidInput("backend handle is not set".to_string()))?;
        let table_name = self
            .table_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("table name is not set".to_string()))?;

        Ok(BulkExecutor {
            backend,
            table_name,
        })
    }
}
