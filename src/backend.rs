use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{KeysAndAttributes, TransactWriteItem, WriteRequest};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::bulk::{Item, Key};
use crate::error::Error;

/// Response of a single bulk-get call against one table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetOutput {
    /// Items found for the requested keys
    pub items: Vec<Item>,
    /// Keys the backend accepted but did not process
    pub unprocessed_keys: Vec<Key>,
}

/// The three call shapes the bulk executor issues against a key-value store
///
/// Implementations must be safe to share between concurrent calls; the executor holds
/// no lock around them. Each call receives the caller's cancellation token and decides
/// for itself how to honour it, reporting [`Error::Cancelled`] when it gives up.
pub trait StorageBackend: Send + Sync {
    /// Fetch up to one read chunk of keys from `table`
    fn batch_get(
        &self,
        cancel: &CancellationToken,
        table: &str,
        keys: Vec<Key>,
    ) -> impl Future<Output = Result<BatchGetOutput, Error>> + Send;

    /// Apply up to one write chunk of put/delete requests to `table`, returning the
    /// requests that were not processed
    fn batch_write(
        &self,
        cancel: &CancellationToken,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> impl Future<Output = Result<Vec<WriteRequest>, Error>> + Send;

    /// Apply up to one transactional chunk atomically
    fn transact_write(
        &self,
        cancel: &CancellationToken,
        items: Vec<TransactWriteItem>,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

impl<B: StorageBackend> StorageBackend for Arc<B> {
    fn batch_get(
        &self,
        cancel: &CancellationToken,
        table: &str,
        keys: Vec<Key>,
    ) -> impl Future<Output = Result<BatchGetOutput, Error>> + Send {
        B::batch_get(self, cancel, table, keys)
    }

    fn batch_write(
        &self,
        cancel: &CancellationToken,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> impl Future<Output = Result<Vec<WriteRequest>, Error>> + Send {
        B::batch_write(self, cancel, table, requests)
    }

    fn transact_write(
        &self,
        cancel: &CancellationToken,
        items: Vec<TransactWriteItem>,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        B::transact_write(self, cancel, items)
    }
}

/// DynamoDB client calls, abandoned when the token fires
///
/// The token is checked before the SDK future is polled, so a call made with a fired
/// token never reaches DynamoDB. A call cancelled later drops the SDK future and reports
/// [`Error::Cancelled`]. The request
/// may already have reached DynamoDB, so its outcome is unknown: a cancelled
/// `transact_write` chunk may have committed, and a cancelled `batch_write` chunk may
/// be partly applied. Read the items back before assuming nothing was written.
impl StorageBackend for Client {
    async fn batch_get(
        &self,
        cancel: &CancellationToken,
        table: &str,
        keys: Vec<Key>,
    ) -> Result<BatchGetOutput, Error> {
        let request = KeysAndAttributes::builder().set_keys(Some(keys)).build()?;
        let call = self.batch_get_item().request_items(table, request).send();

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            output = call => output?,
        };

        let items = output
            .responses
            .and_then(|mut responses| responses.remove(table))
            .unwrap_or_default();

        let unprocessed_keys = output
            .unprocessed_keys
            .and_then(|mut unprocessed| unprocessed.remove(table))
            .map(|keys_attrs| keys_attrs.keys)
            .unwrap_or_default();

        Ok(BatchGetOutput {
            items,
            unprocessed_keys,
        })
    }

    async fn batch_write(
        &self,
        cancel: &CancellationToken,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error> {
        let call = self
            .batch_write_item()
            .request_items(table, requests)
            .send();

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            output = call => output?,
        };

        Ok(output
            .unprocessed_items
            .and_then(|mut unprocessed| unprocessed.remove(table))
            .unwrap_or_default())
    }

    async fn transact_write(
        &self,
        cancel: &CancellationToken,
        items: Vec<TransactWriteItem>,
    ) -> Result<(), Error> {
        let call = self
            .transact_write_items()
            .set_transact_items(Some(items))
            .send();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            output = call => output.map(|_| ()).map_err(Error::from),
        }
    }
}
