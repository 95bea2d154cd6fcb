use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_dynamo::from_items;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backend::StorageBackend;
use crate::bulk::{BulkExecutor, BulkWriteOutput, Key};
use crate::config::DbConfig;
use crate::error::{ChunkFailures, Error};
use crate::requests::{delete_request, put_requests, put_transact_item};

/// Typed records read by [`EntityRepository::get_records`]
#[must_use = "bulk read results contain unprocessed keys that should be checked"]
#[derive(Debug)]
pub struct BulkRecords<T> {
    /// Deserialized records
    pub records: Vec<T>,
    /// Keys to retry
    pub unprocessed_keys: Vec<Key>,
    /// Diagnostic aggregate of failed chunks
    pub error: Option<ChunkFailures>,
}

/// Bulk access to the entity table described by a [`DbConfig`]
#[derive(Debug)]
pub struct EntityRepository<B> {
    executor: BulkExecutor<B>,
    config: DbConfig,
}

impl<B> EntityRepository<B>
where
    B: StorageBackend,
{
    /// Repository over `backend` for the table in `config`
    pub fn new(backend: Arc<B>, config: DbConfig) -> Result<Self, Error> {
        config.validate()?;

        let executor = BulkExecutor::builder()
            .backend(backend)
            .table_name(config.table_name.clone())
            .build()?;

        Ok(Self { executor, config })
    }

    /// Table configuration
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Underlying executor, for raw requests
    pub fn executor(&self) -> &BulkExecutor<B> {
        &self.executor
    }

    /// Epoch-seconds TTL value for a record written at `now`
    pub fn record_expiry(&self, now: DateTime<Utc>) -> i64 {
        self.config.record_expiry(now)
    }

    /// Read and deserialize the records stored under `keys`
    ///
    /// A stored item that does not deserialize into `T` fails the whole call with
    /// [`Error::SerdeDynamo`]; the unprocessed keys and chunk failures of that read are
    /// not returned. Use [`BulkExecutor::bulk_read`] to get raw items back instead.
    pub async fn get_records<T>(
        &self,
        cancel: &CancellationToken,
        keys: Vec<Key>,
    ) -> Result<BulkRecords<T>, Error>
    where
        T: DeserializeOwned,
    {
        let output = self.executor.bulk_read(cancel, keys).await?;

        Ok(BulkRecords {
            records: from_items(output.items)?,
            unprocessed_keys: output.unprocessed_keys,
            error: output.error,
        })
    }

    /// Put `records` best effort; unprocessed puts come back in the output
    pub async fn put_records<T>(
        &self,
        cancel: &CancellationToken,
        records: &[T],
    ) -> Result<BulkWriteOutput, Error>
    where
        T: Serialize,
    {
        let requests = put_requests(records)?;
        self.executor.bulk_write_best_effort(cancel, requests).await
    }

    /// Delete `keys` best effort; unprocessed deletes come back in the output
    pub async fn delete_keys(
        &self,
        cancel: &CancellationToken,
        keys: Vec<Key>,
    ) -> Result<BulkWriteOutput, Error> {
        let requests = keys
            .into_iter()
            .map(delete_request)
            .collect::<Result<Vec<_>, _>>()?;
        self.executor.bulk_write_best_effort(cancel, requests).await
    }

    /// Put `records` in transactional chunks; see
    /// [`BulkExecutor::bulk_write_transactional`] for the cross-chunk caveat
    pub async fn transact_put_records<T>(
        &self,
        cancel: &CancellationToken,
        records: &[T],
    ) -> Result<(), Error>
    where
        T: Serialize,
    {
        let items = records
            .iter()
            .map(|record| put_transact_item(&self.config.table_name, record))
            .collect::<Result<Vec<_>, _>>()?;
        self.executor.bulk_write_transactional(cancel, items).await
    }
}
